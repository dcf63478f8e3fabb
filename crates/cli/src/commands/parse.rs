//! `aicode parse`: run the response parser on stdin.

use std::io::Read;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;

    let parsed = aicode_agent::parse(&input);
    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}
