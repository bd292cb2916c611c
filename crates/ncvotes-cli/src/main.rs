use std::io;
use std::process;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use ncvotes::config::DEFAULT_BASE_URL;
use ncvotes::types::{Chamber, Legislator, Party, VoteRecord};
use ncvotes::utils::{LegislatorFilter, MatrixStats};
use ncvotes::{Drilldown, Motion, Session, SiteConfig, TopicConfig, drilldown, roll_call_matrix};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "ncvotes")]
#[command(
    about = "Scrapes NC General Assembly roll calls and maps legislators' votes on firefighter-related bills",
    long_about = None
)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        long,
        global = true,
        default_value = DEFAULT_BASE_URL,
        env = "NCVOTES_BASE_URL",
        help = "Base URL of the legislature site"
    )]
    base_url: String,

    #[arg(
        long,
        global = true,
        default_value = "house",
        value_parser = parse_chamber,
        help = "Chamber to scrape (house or senate)"
    )]
    chamber: Chamber,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Args, Debug)]
struct TopicArgs {
    #[arg(
        long,
        env = "NCVOTES_KEYWORDS",
        help = "Semicolon-separated topic keywords matched against a bill's Keywords line [default: firefighter keywords]"
    )]
    keywords: Option<String>,

    #[arg(
        long = "motion",
        env = "NCVOTES_MOTIONS",
        value_delimiter = ',',
        value_parser = parse_motion,
        help = "Motion counted toward support/oppose; repeat or comma-separate for several [default: second-reading, third-reading, concur, for-adoption]"
    )]
    motions: Vec<Motion>,
}

impl TopicArgs {
    fn into_config(self) -> Result<TopicConfig, String> {
        let mut config = TopicConfig::default();
        if let Some(keywords) = self.keywords {
            config = TopicConfig::new(&keywords, config.counted_motions);
        }
        if !self.motions.is_empty() {
            config.counted_motions = self.motions;
        }
        config.validate()
    }
}

#[derive(Args, Debug)]
struct FilterArgs {
    #[arg(
        long = "party",
        value_parser = parse_party,
        help = "Keep members of this party; repeat for several"
    )]
    parties: Vec<Party>,

    #[arg(long, help = "Keep districts containing this text")]
    district: Option<String>,

    #[arg(long, help = "Keep members whose counties contain this text")]
    county: Option<String>,

    #[arg(long, help = "Keep members whose name contains this text")]
    name: Option<String>,

    #[arg(
        long,
        help = "Maximum number of members",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    limit: Option<u16>,
}

impl From<FilterArgs> for LegislatorFilter {
    fn from(args: FilterArgs) -> Self {
        LegislatorFilter {
            parties: args.parties,
            district: args.district,
            county: args.county,
            name: args.name,
            limit: args.limit.map(usize::from),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List chamber members with party, district, counties and contact details
    Members {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Show one member's votes on topic-related bills, supports first
    Votes {
        #[arg(help = "Member id (from the biography URL) or full name")]
        member: String,

        #[command(flatten)]
        topic: TopicArgs,

        #[arg(long, help = "Also print the member's full vote history (text or JSON output)")]
        raw: bool,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Build the member × topic-bill roll-call matrix
    Matrix {
        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        topic: TopicArgs,

        #[arg(
            long,
            default_value_t = 1,
            value_parser = clap::value_parser!(u16).range(1..=32),
            help = "Pages fetched at once"
        )]
        concurrency: u16,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
}

/// One JSON document for `votes --raw`.
#[derive(Serialize)]
struct VotesOutput<'a> {
    drilldown: &'a Drilldown,
    history: &'a [VoteRecord],
}

fn check_raw_format(raw: bool, format: &OutputFormat) -> Result<(), String> {
    if raw && matches!(format, OutputFormat::Csv) {
        return Err("--raw cannot be combined with CSV output".to_string());
    }
    Ok(())
}

fn parse_chamber(s: &str) -> Result<Chamber, String> {
    Chamber::from_str(s).map_err(|e| e.to_string())
}

fn parse_party(s: &str) -> Result<Party, String> {
    Party::from_str(s).map_err(|e| e.to_string())
}

fn parse_motion(s: &str) -> Result<Motion, String> {
    Motion::from_str(s).map_err(|e| e.to_string())
}

fn serialize_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn serialize_csv<T: Serialize>(rows: &[T]) {
    let mut writer = csv::Writer::from_writer(io::stdout());
    let result = rows
        .iter()
        .try_for_each(|row| writer.serialize(row))
        .and_then(|_| writer.flush().map_err(csv::Error::from));
    if let Err(e) = result {
        log::error!("Error writing CSV: {}", e);
        process::exit(1);
    }
}

fn members_csv(legislators: &[Legislator]) {
    let mut writer = csv::Writer::from_writer(io::stdout());
    let header = [
        "Member", "Party", "District", "Counties", "Office Phone", "Email", "Contact Phone",
        "Assistant", "Biography", "Votes",
    ];
    let result = writer
        .write_record(header)
        .and_then(|_| {
            legislators.iter().try_for_each(|l| {
                writer.write_record([
                    l.name.as_str(),
                    l.party.code(),
                    l.district.as_str(),
                    l.counties_joined().as_str(),
                    l.office_phone.as_str(),
                    l.email.as_deref().unwrap_or_default(),
                    l.contact_phone.as_deref().unwrap_or_default(),
                    l.assistant.as_str(),
                    l.profile_url.as_str(),
                    l.votes_url.as_str(),
                ])
            })
        })
        .and_then(|_| writer.flush().map_err(csv::Error::from));
    if let Err(e) = result {
        log::error!("Error writing CSV: {}", e);
        process::exit(1);
    }
}

fn find_member<'a>(legislators: &'a [Legislator], member: &str) -> Option<&'a Legislator> {
    legislators
        .iter()
        .find(|l| l.id == member)
        .or_else(|| legislators.iter().find(|l| l.name.eq_ignore_ascii_case(member.trim())))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let site = SiteConfig::new(&cli.base_url, cli.chamber);
    let session = Session::connect(site).unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    });

    let legislators = session.legislators().await.unwrap_or_else(|e| {
        log::error!("Error fetching member data: {}", e);
        process::exit(1);
    });

    match cli.command {
        Commands::Members { filter, format } => {
            let filter = LegislatorFilter::from(filter).validate().unwrap_or_else(|e| {
                log::error!("Invalid args: {e}");
                process::exit(1);
            });
            let legislators = filter.apply(legislators);

            match format {
                OutputFormat::Json => serialize_json(&legislators),
                OutputFormat::Csv => members_csv(&legislators),
                OutputFormat::Text => {
                    if legislators.is_empty() {
                        println!("No members to display.");
                    }
                    for (i, legislator) in legislators.iter().enumerate() {
                        println!("{:>3}. {}", i + 1, legislator);
                    }
                }
            }
        }

        Commands::Votes {
            member,
            topic,
            raw,
            format,
        } => {
            let config = topic.into_config().unwrap_or_else(|e| {
                log::error!("Invalid args: {e}");
                process::exit(1);
            });
            if let Err(e) = check_raw_format(raw, &format) {
                log::error!("Invalid args: {e}");
                process::exit(1);
            }
            let Some(legislator) = find_member(&legislators, &member) else {
                log::error!("No member matches '{}'", member);
                process::exit(1);
            };

            let result = drilldown(&session, &legislator.id, &config).await;
            let history = if raw {
                Some(session.vote_history(&legislator.id).await)
            } else {
                None
            };

            match format {
                OutputFormat::Json => match &history {
                    Some(history) => serialize_json(&VotesOutput {
                        drilldown: &result,
                        history: history.as_slice(),
                    }),
                    None => serialize_json(&result),
                },
                OutputFormat::Csv => serialize_csv(&result.rows),
                OutputFormat::Text => {
                    println!("{}", legislator);
                    if !legislator.office_phone.is_empty() {
                        println!("  Office phone: {}", legislator.office_phone);
                    }
                    if let Some(email) = &legislator.email {
                        println!("  Email: {}", email);
                    }
                    if !legislator.assistant.is_empty() {
                        println!("  Assistant: {}", legislator.assistant);
                    }
                    println!("  Biography: {}", legislator.profile_url);
                    println!("  Votes: {}\n", legislator.votes_url);

                    if result.rows.is_empty() {
                        println!("No topic-related votes found.");
                    }
                    for (i, row) in result.rows.iter().enumerate() {
                        println!("{:>3}. {}", i + 1, row);
                    }

                    if let Some(history) = &history {
                        println!("\nFull vote history:");
                        for vote in history.iter() {
                            println!("  {}", vote);
                        }
                    }
                }
            }
        }

        Commands::Matrix {
            filter,
            topic,
            concurrency,
            format,
        } => {
            let config = topic.into_config().unwrap_or_else(|e| {
                log::error!("Invalid args: {e}");
                process::exit(1);
            });
            let filter = LegislatorFilter::from(filter).validate().unwrap_or_else(|e| {
                log::error!("Invalid args: {e}");
                process::exit(1);
            });
            let legislators = filter.apply(legislators);

            let mut matrix =
                roll_call_matrix(&session, &legislators, &config, concurrency.into()).await;
            matrix.sort_for_display();

            match format {
                OutputFormat::Json => serialize_json(&matrix),
                OutputFormat::Csv => serialize_csv(&matrix.rows),
                OutputFormat::Text => {
                    if matrix.rows.is_empty() {
                        println!("No topic-related bills found for these keywords.");
                    } else {
                        for (i, row) in matrix.rows.iter().enumerate() {
                            println!("{:>4}. {}", i + 1, row);
                        }
                        print!("{}", MatrixStats::from_matrix(&matrix));
                    }
                }
            }
        }
    }
}
