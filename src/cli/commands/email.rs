use anyhow::Result;
use clap::{Arg, Command};
use secrecy::SecretString;

pub const ARG_RESEND_API_KEY: &str = "resend-api-key";
pub const ARG_EMAIL_FROM: &str = "email-from";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_RESEND_API_KEY)
                .long(ARG_RESEND_API_KEY)
                .help("Resend API key; when absent, outbound email is logged instead of sent")
                .env("BAKULAN_RESEND_API_KEY"),
        )
        .arg(
            Arg::new(ARG_EMAIL_FROM)
                .long(ARG_EMAIL_FROM)
                .help("From address for transactional email")
                .env("BAKULAN_EMAIL_FROM")
                .default_value("Bakulan <onboarding@resend.dev>"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub resend_api_key: Option<SecretString>,
    pub email_from: String,
}

impl Options {
    /// Extract email options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        use anyhow::Context;

        Ok(Self {
            resend_api_key: matches
                .get_one::<String>(ARG_RESEND_API_KEY)
                .map(|key| SecretString::from(key.clone())),
            email_from: matches
                .get_one::<String>(ARG_EMAIL_FROM)
                .cloned()
                .context("missing required argument: --email-from")?,
        })
    }
}
