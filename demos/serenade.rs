use std::path::PathBuf;
use std::time::Instant;

use serenade_rs::{
    assets::AssetStore,
    engines::serenade::{RenderParamsBuilder, SerenadeEngine},
    SongEngine, SongLength, Studio,
};

// Usage:
//   cargo run --example serenade -- [short|medium|long] [--seed N] [--out DIR] [--model DIR]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let length: SongLength = args
        .get(1)
        .filter(|s| !s.starts_with("--"))
        .map(|s| s.parse::<SongLength>())
        .transpose()?
        .unwrap_or(SongLength::Medium);
    let seed: Option<u64> = parse_flag(&args, "--seed")?;
    let out_dir = PathBuf::from(parse_flag::<String>(&args, "--out")?.unwrap_or_else(|| ".".into()));

    let mut engine = match seed {
        Some(s) => SerenadeEngine::with_seed(s),
        None => SerenadeEngine::new(),
    };
    if let Some(model_dir) = parse_flag::<String>(&args, "--model")? {
        engine.load_model(&PathBuf::from(model_dir))?;
    }

    let params = RenderParamsBuilder::default().sample_rate(44_100).build()?;
    let mut studio = Studio::with_engine(engine, AssetStore::new()).with_params(params);

    println!("Length: {} ({})", length, length.label());

    let start = Instant::now();
    let composition = studio.create_song(length).await?.clone();
    let elapsed = start.elapsed();

    if let Some(lyrics) = studio.lyrics() {
        println!();
        println!("{}", lyrics.title);
        for (i, verse) in lyrics.verses.iter().enumerate() {
            println!();
            println!("ചരണം {}", i + 1);
            for line in verse {
                println!("  {line}");
            }
        }
        println!();
        println!("പല്ലവി");
        for line in lyrics.refrain_lines() {
            println!("  {line}");
        }
        println!();
        println!("{}", lyrics.outro);
        println!();
    }

    println!(
        "Composed {:.2}s of audio in {:.2?} ({:.1}x real-time)",
        composition.duration_secs,
        elapsed,
        composition.duration_secs / elapsed.as_secs_f64()
    );

    let path = studio.download(&out_dir)?;
    println!("Saved to {}", path.display());

    studio.release();
    Ok(())
}

/// Value following `flag`, if the flag is present. A flag with a missing or
/// unparseable value is an error rather than a silent default.
fn parse_flag<T: std::str::FromStr>(
    args: &[String],
    flag: &str,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let Some(i) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    let value = args
        .get(i + 1)
        .ok_or_else(|| format!("{flag} needs a value"))?;
    value
        .parse()
        .map(Some)
        .map_err(|_| format!("invalid value for {flag}: '{value}'").into())
}
