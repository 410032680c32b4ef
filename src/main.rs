use anyhow::Result;
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use krishi_advisor::{
    AdvisorApi, AdvisorClient,
    client::{
        ChatRequest, CropPriceQuery, FarmDataApi, FertilizerPriceQuery, ImageInput, Location,
        SchemeCategory, SchemeQuery, VoiceReply, VoiceRequest,
    },
    config, display,
};
use std::{io::Write, path::PathBuf};
use tracing::info;

/// Command-line client for the KrishiSevak advisory service.
#[derive(Parser, Debug)]
#[command(name = "krishi")]
#[command(about = "Talk to the KrishiSevak agricultural advisor")]
#[command(version)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "CONFIG_PATH", default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the service is up
    Health,
    /// Ask the advisor a question
    Chat {
        message: String,
        /// Conversation id; defaults to the configured session
        #[arg(long)]
        session: Option<String>,
        /// Print the reply token by token as it arrives
        #[arg(long)]
        stream: bool,
    },
    /// Identify a crop disease from a photo
    Classify { image: PathBuf },
    /// Send a voice question
    Voice {
        audio: PathBuf,
        /// Ask for a transcript instead of spoken audio
        #[arg(long)]
        no_tts: bool,
        #[arg(long)]
        language: Option<String>,
        /// Where to write the spoken reply
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Convert text to speech
    Speak {
        text: String,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Check that the farm data service is ready to serve requests
    Ready,
    /// Current weather and farming advisory for a location
    Weather {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
    },
    /// Market prices near a location
    Prices {
        location: String,
        /// Only this crop
        #[arg(long, conflicts_with = "fertilizer")]
        crop: Option<String>,
        /// Show fertilizer prices of this type instead of crop prices
        #[arg(long)]
        fertilizer: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Government schemes for farmers
    Schemes {
        #[arg(long, value_parser = parse_category)]
        category: Option<SchemeCategory>,
        #[arg(long)]
        state: Option<String>,
        /// Include schemes that are no longer open
        #[arg(long)]
        all: bool,
    },
}

fn parse_category(raw: &str) -> std::result::Result<SchemeCategory, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_ascii_lowercase()))
        .map_err(|e| e.to_string())
        .and_then(|category| match category {
            SchemeCategory::Other => Err(format!("unknown scheme category '{}'", raw)),
            known => Ok(known),
        })
}

/// Validates that a log level string is valid
fn validate_log_level(level: &str) -> Result<()> {
    level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
                level
            )
        })?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (before logging setup)
    let config = match config::load_from(&args.config).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Environment variable overrides config
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.logs.level.clone());
    if std::env::var("RUST_LOG").is_err() {
        if let Err(e) = validate_log_level(&log_level) {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_new(&log_level)?)
        .with_writer(std::io::stderr)
        .json()
        .init();

    info!("Using advisor service at {}", config.client.base_url);

    let client = AdvisorClient::new(&config.client)?;

    if let Err(e) = run(&client, args.command).await {
        eprintln!("{}", display::failure_message(&e));
        std::process::exit(1);
    }

    Ok(())
}

async fn run(client: &AdvisorClient, command: Command) -> krishi_advisor::Result<()> {
    match command {
        Command::Health => {
            let health = client.check_health().await?;
            println!("{}", display::health(&Ok(health)));
            Ok(())
        }
        Command::Chat {
            message,
            session,
            stream,
        } => {
            let session = session.unwrap_or_else(|| client.session_id().to_string());
            let request = ChatRequest::new(session, message);
            if stream {
                let mut tokens = client.stream_chat(request).await?;
                let mut stdout = std::io::stdout();
                while let Some(token) = tokens.next().await {
                    write!(stdout, "{}", token?)?;
                    stdout.flush()?;
                }
                writeln!(stdout)?;
                Ok(())
            } else {
                let response = client.send_chat(request).await?;
                println!("{}", response.text);
                Ok(())
            }
        }
        Command::Classify { image } => {
            let bytes = tokio::fs::read(&image).await?;
            let result = client.classify_image(ImageInput::Encoded(bytes)).await?;
            println!("{}", display::classification(&Ok(result)));
            Ok(())
        }
        Command::Voice {
            audio,
            no_tts,
            language,
            out,
        } => {
            let filename = audio
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "audio.wav".to_string());
            let mut request = VoiceRequest::new(tokio::fs::read(&audio).await?, filename);
            request.tts = !no_tts;
            request.language = language;

            match client.send_voice(request).await? {
                VoiceReply::Audio(speech) => {
                    let out =
                        out.unwrap_or_else(|| PathBuf::from(format!("reply.{}", speech.extension())));
                    tokio::fs::write(&out, &speech.bytes).await?;
                    println!("Saved spoken reply to {}", out.display());
                }
                VoiceReply::Transcript(reply) => {
                    println!("You said: {}", reply.transcript);
                    println!("{}", reply.reply);
                }
            }
            Ok(())
        }
        Command::Speak {
            text,
            language,
            out,
        } => {
            let speech = client.synthesize_speech(&text, language.as_deref()).await?;
            tokio::fs::write(&out, &speech.bytes).await?;
            println!("Saved {} ({}) to {}", speech.media_type, speech.bytes.len(), out.display());
            Ok(())
        }
        Command::Ready => {
            let health = client.readiness().await?;
            println!("{}", display::health(&Ok(health)));
            Ok(())
        }
        Command::Weather {
            latitude,
            longitude,
        } => {
            let forecast = client
                .current_weather(&Location::new(latitude, longitude))
                .await?;
            println!("{}", display::weather(&forecast));
            Ok(())
        }
        Command::Prices {
            location,
            crop,
            fertilizer,
            limit,
        } => {
            if let Some(fertilizer_type) = fertilizer {
                let mut query = FertilizerPriceQuery::new(location).fertilizer_type(fertilizer_type);
                query.limit = limit;
                for price in client.fertilizer_prices(&query).await? {
                    println!("{}", display::fertilizer_price(&price));
                }
            } else {
                let mut query = CropPriceQuery::new(location);
                query.crop_name = crop;
                query.limit = limit;
                for price in client.crop_prices(&query).await? {
                    println!("{}", display::crop_price(&price));
                }
            }
            Ok(())
        }
        Command::Schemes {
            category,
            state,
            all,
        } => {
            let query = SchemeQuery {
                category,
                state,
                active_only: !all,
                ..SchemeQuery::default()
            };
            for scheme in client.government_schemes(&query).await? {
                println!("{}", display::scheme(&scheme));
            }
            Ok(())
        }
    }
}
