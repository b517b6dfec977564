//! `devices` subcommand — list sound cards and which ones have a known layout.

use super::{CardJson, DevicesOutput, Result, endpoint};
use scarlett_mixer_lib::models;

pub(super) fn cmd_devices(json: bool) -> Result<()> {
    let cards: Vec<CardJson> = endpoint::enumerate_cards()
        .into_iter()
        .map(|(device, name)| CardJson { device, name })
        .collect();

    if json {
        let output = DevicesOutput {
            count: cards.len(),
            cards,
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return Ok(());
    }

    if cards.is_empty() {
        println!("No sound cards found.");
        return Ok(());
    }

    println!(
        "Found {} sound card{}:",
        cards.len(),
        if cards.len() == 1 { "" } else { "s" }
    );
    println!();

    for card in &cards {
        let known = if models::lookup(&card.name).is_some() {
            " [built-in layout]"
        } else {
            ""
        };
        println!("  {:<8}{}{known}", card.device, card.name);
    }

    Ok(())
}
