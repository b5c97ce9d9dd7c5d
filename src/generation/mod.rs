//! Answer generation
//!
//! Turns a question plus retrieved context into the final answer by piping
//! a grounding prompt into an external generation process. The process is
//! a black box: prompt on stdin, answer on stdout, stderr logged but never
//! parsed. Timeout, failure, and "nothing relevant" are three distinct
//! outcomes and must never collapse into each other.

use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Answer used when the corpus has nothing relevant or the model produced
/// no output
pub const NOT_FOUND_ANSWER: &str = "Not found in book.";

/// Answer used when the generation process exceeds its deadline
pub const TIMEOUT_ANSWER: &str = "LLM timeout. Try a shorter question.";

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Failed to start generation process '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Generation process I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generation process exited with {status}: {stderr}")]
    ProcessFailed {
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Outcome of one generation attempt
///
/// Hard failures (spawn, non-zero exit) are errors; a timeout is a normal,
/// user-visible outcome and gets its own variant instead.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationReply {
    Completed(String),
    TimedOut,
}

/// Trait for answer generation backends
pub trait GenerationBackend: Send + Sync {
    /// Run one blocking prompt/answer exchange
    fn generate(&self, prompt: &str) -> Result<GenerationReply, GenerateError>;
}

/// Backend that runs an external command per question
///
/// Each call spawns the command fresh, writes the prompt to its stdin,
/// and reads its stdout as the answer. No session is reused across
/// questions.
pub struct ProcessBackend {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessBackend {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Backend invoking `ollama run <model>`
    pub fn ollama(model: &str, timeout: Duration) -> Self {
        Self::new("ollama", vec!["run".to_string(), model.to_string()], timeout)
    }
}

impl GenerationBackend for ProcessBackend {
    fn generate(&self, prompt: &str) -> Result<GenerationReply, GenerateError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| GenerateError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        // All pipe I/O runs on its own threads: the writer so a backend
        // that stalls without reading stdin cannot block past the deadline
        // on a full pipe buffer, the readers so a chatty process cannot
        // deadlock against one while we poll for exit.
        let stdin_writer = spawn_writer(child.stdin.take(), prompt.as_bytes().to_vec());
        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None => {
                    if Instant::now() >= deadline {
                        tracing::warn!(
                            "Generation process exceeded {:?}, killing it",
                            self.timeout
                        );
                        // Killing the child closes its pipe ends, which
                        // unblocks all three I/O threads.
                        let _ = child.kill();
                        let _ = child.wait();
                        let _ = stdin_writer.join();
                        let _ = stdout_reader.join();
                        let _ = stderr_reader.join();
                        return Ok(GenerationReply::TimedOut);
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        };

        // The child has exited, so a writer still blocked on the pipe is
        // guaranteed to unblock with BrokenPipe.
        let written = stdin_writer.join().unwrap_or(Ok(()));
        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        if !stderr.trim().is_empty() {
            tracing::debug!("Generation process stderr: {}", stderr.trim());
        }

        if !status.success() {
            return Err(GenerateError::ProcessFailed {
                status,
                stderr: stderr.trim().to_string(),
            });
        }

        // A backend that exits cleanly before reading all input is fine;
        // its exit status decides success, not the pipe.
        if let Err(e) = written {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(GenerateError::Io(e));
            }
        }

        Ok(GenerationReply::Completed(stdout))
    }
}

fn spawn_writer<W: Write + Send + 'static>(
    sink: Option<W>,
    bytes: Vec<u8>,
) -> JoinHandle<std::io::Result<()>> {
    std::thread::spawn(move || {
        // Dropping the sink on return closes the pipe, signalling EOF.
        match sink {
            Some(mut sink) => sink.write_all(&bytes),
            None => Ok(()),
        }
    })
}

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut reader) = source {
            let _ = reader.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Build the grounding prompt fed to the generation backend
///
/// Four parts in fixed order: the grounding instruction, the context, the
/// question, and the answer cue. The instruction is the only grounding
/// mechanism; nothing verifies the output against the context afterwards.
pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are a strict academic assistant.\n\
         \n\
         You MUST answer only from the given CONTEXT.\n\
         If the answer is missing, respond exactly with: {}\n\
         Do NOT use outside knowledge. Do NOT guess.\n\
         \n\
         CONTEXT:\n\
         {}\n\
         \n\
         QUESTION:\n\
         {}\n\
         \n\
         ANSWER (only from context):\n",
        NOT_FOUND_ANSWER, context, question
    )
}

/// Produces the final answer text for a question
pub struct AnswerGenerator<B: GenerationBackend> {
    backend: B,
}

impl<B: GenerationBackend> AnswerGenerator<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Answer a question given the retrieved context
    ///
    /// With no context the fallback is returned without invoking the
    /// backend at all, so the refusal is deterministic and instant.
    pub fn answer(&self, question: &str, context: Option<&str>) -> Result<String, GenerateError> {
        let context = match context {
            Some(context) => context,
            None => {
                tracing::debug!("No context within threshold, skipping generation");
                return Ok(NOT_FOUND_ANSWER.to_string());
            }
        };

        let prompt = build_prompt(question, context);
        match self.backend.generate(&prompt)? {
            GenerationReply::Completed(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Ok(NOT_FOUND_ANSWER.to_string())
                } else {
                    Ok(trimmed.to_string())
                }
            }
            GenerationReply::TimedOut => Ok(TIMEOUT_ANSWER.to_string()),
        }
    }
}
