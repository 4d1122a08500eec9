//! Interactive terminal form.
//!
//! Asks for the account URL and the number of videos (with the CLI values as
//! defaults) and a go-ahead, then, after the scrape, offers to save a copy of
//! the CSV somewhere else. Blank answers keep the default.

use crate::cli::{MAX_COUNT, MIN_COUNT, parse_count};
use std::error::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, instrument};

/// Values collected by the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormInput {
    pub url: String,
    pub count: u32,
}

/// Line-oriented prompt over any async reader/writer pair.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> Prompter<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Show `label [default]: ` and read one line. `None` on end of input.
    async fn ask(&mut self, label: &str, default: &str) -> Result<Option<String>, Box<dyn Error>> {
        let prompt = if default.is_empty() {
            format!("{label}: ")
        } else {
            format!("{label} [{default}]: ")
        };
        self.output.write_all(prompt.as_bytes()).await?;
        self.output.flush().await?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    async fn say(&mut self, message: &str) -> Result<(), Box<dyn Error>> {
        self.output.write_all(message.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }

    /// Ask for the account URL, the video count and confirmation to start.
    ///
    /// An out-of-range or non-numeric count is re-asked until valid. Returns
    /// `None` when the user declines to start.
    #[instrument(level = "debug", skip(self))]
    pub async fn scrape_form(
        &mut self,
        defaults: FormInput,
    ) -> Result<Option<FormInput>, Box<dyn Error>> {
        let url = match self.ask("TikTok account URL", &defaults.url).await? {
            Some(answer) if !answer.is_empty() => answer,
            _ => defaults.url.clone(),
        };

        let count = loop {
            let label = format!("Number of videos to scrape ({MIN_COUNT}-{MAX_COUNT})");
            match self.ask(&label, &defaults.count.to_string()).await? {
                None => break defaults.count,
                Some(answer) if answer.is_empty() => break defaults.count,
                Some(answer) => match parse_count(&answer) {
                    Ok(count) => break count,
                    Err(e) => self.say(&e).await?,
                },
            }
        };

        if !self.confirm("Start scraping? [Y/n]").await? {
            debug!("Scrape declined");
            return Ok(None);
        }

        debug!(%url, count, "Form submitted");
        Ok(Some(FormInput { url, count }))
    }

    /// Yes/no question defaulting to yes. Anything but `n`/`no` is a yes.
    async fn confirm(&mut self, question: &str) -> Result<bool, Box<dyn Error>> {
        let answer = self.ask(question, "").await?.unwrap_or_default();
        Ok(!matches!(answer.to_lowercase().as_str(), "n" | "no"))
    }

    /// Ask where to save a copy of the export. `None` when the user skips.
    pub async fn download_target(&mut self) -> Result<Option<String>, Box<dyn Error>> {
        let answer = self
            .ask("Save a copy of the CSV to (leave blank to skip)", "")
            .await?;
        Ok(answer.filter(|a| !a.is_empty()))
    }

    /// Print a block of text followed by a newline.
    pub async fn show(&mut self, text: &str) -> Result<(), Box<dyn Error>> {
        self.say(text).await
    }
}
