//! Basic speech synthesis example
//!
//! Lists the native engine's voices, then reads the command line arguments
//! (or a default sentence) into the text slot under `./out`.

use lectern_spk::{SlotName, SlotStore, SpeechConfig, SpeechSynthesizer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let slots = SlotStore::new("out")?;
    let synthesizer = SpeechSynthesizer::new(&SpeechConfig::default(), slots)?;

    for voice in synthesizer.registry().list_voices().await? {
        println!("{:<24} {}", voice.id, voice.name);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let text = if args.is_empty() {
        "Hello, this document is being read aloud.".to_string()
    } else {
        args.join(" ")
    };

    println!("Synthesizing speech...");
    match synthesizer.synthesize(&text, None, SlotName::Text).await {
        Ok(artifact) => println!(
            "Wrote {} bytes to {}",
            artifact.bytes.len(),
            synthesizer.slots().path(artifact.slot).display()
        ),
        Err(e) => eprintln!("Failed to synthesize speech: {}", e),
    }

    Ok(())
}
