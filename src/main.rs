use anyhow::Result;
use clap::{Parser, Subcommand};
use deepfake_detector::ai::{DetectionBackend, GeminiDetectionClient, ProxyDetectionClient};
use deepfake_detector::analysis::Analyzer;
use deepfake_detector::media::MediaType;
use deepfake_detector::models::Config;
use deepfake_detector::server;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "deepfake-detector")]
#[command(about = "Ask a multimodal model whether an image or video is AI-generated")]
struct CliArgs {
    /// Override the Gemini model ID (GEMINI_MODEL).
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the detect proxy (POST /api/detect).
    Serve {
        /// Address to listen on (BIND_ADDR).
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Analyze a local image or video file.
    Analyze {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// `image` or `video`; inferred from the file when omitted.
        #[arg(long, value_parser = parse_media_type)]
        media_type: Option<MediaType>,

        /// Send through a detect proxy instead of calling Gemini directly (DETECT_PROXY_URL).
        #[arg(long, value_name = "URL")]
        proxy: Option<String>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn parse_media_type(input: &str) -> std::result::Result<MediaType, String> {
    input.parse()
}

fn build_backend(config: &Config, proxy: Option<String>) -> Result<Box<dyn DetectionBackend>> {
    let http_client = reqwest::Client::new();
    match proxy.or_else(|| config.proxy_url.clone()) {
        Some(url) => {
            info!("Analysis via proxy {}", url);
            Ok(Box::new(ProxyDetectionClient::new_with_client(
                &url,
                config.request_timeout,
                http_client,
            )))
        }
        None => {
            info!("Analysis via Gemini (model: {})", config.gemini_model);
            Ok(Box::new(GeminiDetectionClient::from_config(
                config,
                http_client,
            )?))
        }
    }
}

async fn run(args: CliArgs) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(model) = args.model {
        config.gemini_model = model;
    }

    match args.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            server::serve(&config).await?;
        }
        Command::Analyze {
            file,
            media_type,
            proxy,
            json,
        } => {
            let analyzer = Analyzer::new(build_backend(&config, proxy)?);
            let report = analyzer.report_file(&file, media_type).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Verdict: {}", report.result.verdict());
                println!("Reasoning: {}", report.result.reasoning());
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deepfake_detector=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Error analyzing image: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_media_type_valid() {
        assert_eq!(parse_media_type("video").unwrap(), MediaType::Video);
    }

    #[test]
    fn test_parse_media_type_invalid() {
        let err = parse_media_type("audio").unwrap_err();
        assert!(err.contains("'image' or 'video'"));
    }

    #[test]
    fn test_cli_parses_analyze_flags() {
        let args = CliArgs::parse_from([
            "deepfake-detector",
            "analyze",
            "clip.mp4",
            "--media-type",
            "video",
            "--proxy",
            "http://localhost:3000",
            "--json",
        ]);
        match args.command {
            Command::Analyze {
                file,
                media_type,
                proxy,
                json,
            } => {
                assert_eq!(file, PathBuf::from("clip.mp4"));
                assert_eq!(media_type, Some(MediaType::Video));
                assert_eq!(proxy.as_deref(), Some("http://localhost:3000"));
                assert!(json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_direct_backend_requires_key() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert!(build_backend(&config, None).is_err());
        assert!(build_backend(&config, Some("http://localhost:3000".to_string())).is_ok());
    }
}
