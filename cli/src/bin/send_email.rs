use anyhow::Result;
use clap::Parser;
use plantmail_cli::{init_logging, notifier_from_env, report};

#[derive(Parser)]
#[command(name = "send-email", about = "Send a notification email")]
struct Cli {
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbosity: u8,

    /// Recipient email address
    #[arg(long)]
    recipient: String,

    /// Email content
    #[arg(long)]
    content: String,

    /// Email subject line
    #[arg(long)]
    subject: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity)?;

    let outcome = match notifier_from_env() {
        Ok(notifier) => {
            notifier
                .send_email(&cli.recipient, &cli.content, &cli.subject)
                .await
        }
        Err(e) => Err(e),
    };
    report(outcome);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_flags_required() {
        assert!(Cli::try_parse_from(["send-email", "--recipient", "a@b.com"]).is_err());

        let cli = Cli::try_parse_from([
            "send-email",
            "--recipient",
            "a@b.com",
            "--content",
            "Hello",
            "--subject",
            "Verify your account",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.subject, "Verify your account");
        assert_eq!(cli.verbosity, 2);
    }
}
