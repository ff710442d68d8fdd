//! Line-oriented driver for the emergency process.
//!
//! DESIGN
//! ======
//! The console owns the input lines and the output sink; the process and
//! auth context are borrowed from [`AppState`]. Each loop iteration prints
//! the progress indicator and the mounted step's prompt, reads one command,
//! and hands it to that step. Voice recording consumes the next line as its
//! stop signal; end of input leaves the recording to its limit. The helpline step races its connection against input so
//! `skip` and `quit` still work while connecting.
//!
//! ERROR HANDLING
//! ==============
//! Errors a user can act on are printed; device permission errors are only
//! logged. I/O errors on the terminal end the session.

#[cfg(test)]
#[path = "console_test.rs"]
mod console_test;

use std::fmt::Display;
use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::warn;

use crate::app::AppState;
use crate::cli::CliError;
use crate::error::ErrorCode;
use crate::steps::{self, helpline::CONNECTED_MESSAGE, questionnaire};
use crate::wizard::{ActiveStep, Disposition, EmergencyProcess, StepKind, StepOutcome};

/// How an interactive session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Settled,
    Quit,
    SignInRequired,
}

enum Input {
    Line(String),
    Connected,
    Eof,
}

impl Input {
    fn from_line(line: Option<String>) -> Self {
        line.map_or(Self::Eof, Self::Line)
    }
}

pub struct Console<R, W> {
    lines: Lines<R>,
    out: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, out: W) -> Self {
        Self { lines: input.lines(), out }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Walk the signed-in user through the process until the last step
    /// settles, input ends, or they quit.
    ///
    /// # Errors
    ///
    /// Terminal I/O failures.
    pub async fn run_emergency(&mut self, app: &mut AppState) -> Result<SessionEnd, CliError> {
        let Some(mut process) = app.open_emergency_process().await else {
            writeln!(self.out, "{}", steps::SIGN_IN_REQUIRED_MESSAGE)?;
            return Ok(SessionEnd::SignInRequired);
        };

        self.announce(&process).await?;
        loop {
            let before = process.sequencer().index();
            match self.next_input(&mut process).await? {
                Input::Eof => return Ok(SessionEnd::Quit),
                Input::Connected => {}
                Input::Line(line) => {
                    let mut words = line.split_whitespace();
                    let Some(command) = words.next() else {
                        continue;
                    };
                    let args: Vec<&str> = words.collect();
                    match command {
                        "quit" => return Ok(SessionEnd::Quit),
                        "skip" => {
                            process.skip().await;
                        }
                        _ => self.dispatch(&mut process, app, command, &args).await?,
                    }
                }
            }

            if process.sequencer().is_settled() {
                self.print_progress(&process)?;
                writeln!(self.out, "Emergency process complete.")?;
                return Ok(SessionEnd::Settled);
            }
            if process.sequencer().index() != before {
                self.announce(&process).await?;
            }
        }
    }

    /// Next command line. On the helpline step a finished connection
    /// completes the step before any line arrives; end of input there waits
    /// for the connection instead of quitting.
    async fn next_input(&mut self, process: &mut EmergencyProcess) -> Result<Input, CliError> {
        self.out.flush()?;
        let connected = if let ActiveStep::Helpline(helpline) = process.active_mut() {
            tokio::select! {
                connected = helpline.connected() => connected,
                line = self.lines.next_line() => match line? {
                    Some(line) => return Ok(Input::Line(line)),
                    None => helpline.connected().await,
                },
            }
        } else {
            return Ok(Input::from_line(self.lines.next_line().await?));
        };

        let Some(connected) = connected else {
            return Ok(Input::Eof);
        };
        writeln!(self.out, "{CONNECTED_MESSAGE}")?;
        process.complete(&StepOutcome::Helpline(connected)).await?;
        Ok(Input::Connected)
    }

    async fn dispatch(
        &mut self,
        process: &mut EmergencyProcess,
        app: &AppState,
        command: &str,
        args: &[&str],
    ) -> Result<(), CliError> {
        let outcome = match (process.active_mut(), command) {
            (ActiveStep::Location(step), "pick") => {
                let (Some(lat), Some(lng)) = (parse_coord(args.first()), parse_coord(args.get(1))) else {
                    writeln!(self.out, "usage: pick <lat> <lng>")?;
                    return Ok(());
                };
                match step.select_point(lat, lng).await {
                    Ok(record) => writeln!(self.out, "Selected: {}", record.address)?,
                    Err(e) => self.report(&e)?,
                }
                None
            }
            (ActiveStep::Location(step), "confirm") => match step.confirm(&app.auth).await {
                Ok(record) => Some(StepOutcome::Location(record)),
                Err(e) => {
                    self.report(&e)?;
                    None
                }
            },
            (ActiveStep::Questionnaire(step), "yes" | "no") => {
                step.choose(command == "yes");
                None
            }
            (ActiveStep::Questionnaire(step), "continue") => match step.submit() {
                Ok(answer) => Some(StepOutcome::Questionnaire(answer)),
                Err(e) => {
                    self.report(&e)?;
                    None
                }
            },
            (ActiveStep::Voice(step), "record") => {
                writeln!(self.out, "Recording... press Enter to stop ({}s max)", step.limit_secs())?;
                self.out.flush()?;
                let mut read_error = None;
                let stop = stop_on_line(&mut self.lines, &mut read_error);
                let recorded = step.record(stop).await;
                if let Some(e) = read_error {
                    return Err(e.into());
                }
                match recorded {
                    Ok(Some(clip)) => {
                        writeln!(self.out, "Recorded {}s", clip.duration_secs)?;
                        Some(StepOutcome::Voice(clip))
                    }
                    Ok(None) => None,
                    Err(e) => {
                        self.report(&e)?;
                        None
                    }
                }
            }
            (ActiveStep::Image(step), "capture") => match step.capture() {
                Ok(image) => {
                    writeln!(self.out, "Captured {}x{} image", image.width, image.height)?;
                    Some(StepOutcome::Image(image))
                }
                Err(e) => {
                    self.report(&e)?;
                    None
                }
            },
            (active, _) => {
                writeln!(self.out, "unknown command `{command}` for {}", active.kind())?;
                None
            }
        };

        if let Some(outcome) = outcome {
            if let Err(e) = process.complete(&outcome).await {
                self.report(&e)?;
            }
        }
        Ok(())
    }

    async fn announce(&mut self, process: &EmergencyProcess) -> Result<(), CliError> {
        self.print_progress(process)?;
        let kind = process.current();
        writeln!(self.out, "{}: {}", kind.title(), kind.description())?;
        match process.active() {
            ActiveStep::Location(step) => {
                let center = step.locate().await;
                if let Some(notice) = center.notice {
                    writeln!(self.out, "{notice}")?;
                }
                writeln!(self.out, "Map centered at {}", center.center)?;
                writeln!(self.out, "Commands: pick <lat> <lng>, confirm, skip, quit")?;
            }
            ActiveStep::Questionnaire(_) => {
                writeln!(self.out, "{}", questionnaire::QUESTION)?;
                writeln!(
                    self.out,
                    "  yes: {}\n  no:  {}",
                    questionnaire::YES_LABEL,
                    questionnaire::NO_LABEL
                )?;
                writeln!(self.out, "Commands: yes, no, continue, skip, quit")?;
            }
            ActiveStep::Voice(step) => {
                writeln!(self.out, "{}", step.prompt())?;
                writeln!(self.out, "Commands: record, skip, quit")?;
            }
            ActiveStep::Image(step) => {
                if step.has_preview() {
                    writeln!(self.out, "Camera ready")?;
                }
                writeln!(self.out, "Commands: capture, skip, quit")?;
            }
            ActiveStep::Helpline(_) => {
                writeln!(self.out, "Connecting to emergency helpline...")?;
            }
        }
        Ok(())
    }

    fn print_progress(&mut self, process: &EmergencyProcess) -> Result<(), CliError> {
        let marks: Vec<String> = process
            .progress()
            .iter()
            .map(|entry| {
                let mark = match entry.disposition {
                    Disposition::Completed => 'x',
                    Disposition::Skipped => '-',
                    Disposition::Pending if entry.kind == process.current() => '>',
                    Disposition::Pending => ' ',
                };
                format!("[{mark}]")
            })
            .collect();
        let step = process.current().index() + 1;
        writeln!(self.out, "{} step {step}/{}", marks.join(""), StepKind::ALL.len())?;
        Ok(())
    }

    fn report<E>(&mut self, error: &E) -> Result<(), CliError>
    where
        E: ErrorCode + Display,
    {
        if error.is_surfaced() {
            writeln!(self.out, "Error: {error}")?;
        } else {
            warn!(error = %error, code = error.error_code(), "not shown to user");
        }
        Ok(())
    }
}

/// Resolves on the next input line. End of input never resolves, so the
/// recording limit ends it instead; a read error resolves and is handed back.
async fn stop_on_line<R>(lines: &mut Lines<R>, read_error: &mut Option<std::io::Error>)
where
    R: AsyncBufRead + Unpin,
{
    match lines.next_line().await {
        Ok(Some(_)) => {}
        Ok(None) => std::future::pending().await,
        Err(e) => *read_error = Some(e),
    }
}

fn parse_coord(arg: Option<&&str>) -> Option<f64> {
    arg.and_then(|s| s.parse().ok())
}
