use anyhow::Result;
use clap::Parser;
use plantmail::CareNeeds;
use plantmail_cli::{init_logging, notifier_from_env, report};

const CONTENT_SUBJECT: &str = "Your plants need some care!";

#[derive(Parser)]
#[command(name = "plant-care-email", about = "Send a plant-care reminder")]
struct Cli {
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbosity: u8,

    /// Recipient email address
    #[arg(long)]
    recipient: String,

    /// Plant the reminder is about
    #[arg(long, required_unless_present = "content")]
    plant_name: Option<String>,

    /// Display name for the recipient (defaults to the address)
    #[arg(long, requires = "plant_name")]
    username: Option<String>,

    #[arg(long, requires = "plant_name")]
    needs_fertilizer: bool,

    #[arg(long, requires = "plant_name")]
    needs_water: bool,

    /// Literal reminder text, sent instead of a composed reminder
    #[arg(long, conflicts_with = "plant_name")]
    content: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity)?;

    let notifier = match notifier_from_env() {
        Ok(notifier) => notifier,
        Err(e) => {
            report(Err(e));
            return Ok(());
        }
    };

    let outcome = match cli.plant_name {
        Some(plant_name) => {
            let username = cli.username.as_deref().unwrap_or(&cli.recipient);
            let needs = CareNeeds::new(cli.needs_fertilizer, cli.needs_water);
            notifier
                .send_care_email(&cli.recipient, &plant_name, username, needs)
                .await
        }
        // clap guarantees --content when --plant-name is absent
        None => {
            let content = cli.content.unwrap_or_default();
            notifier
                .send_email(&cli.recipient, &content, CONTENT_SUBJECT)
                .await
        }
    };
    report(outcome);

    Ok(())
}
