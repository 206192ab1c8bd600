use super::{DriverError, PlayoutDriver, MELTED_DRIVER};
use crate::config::MeltedConfig;
use crate::types::{PlaybackStatus, RemoteClip, RemoteStatus};
use async_trait::async_trait;
use std::future::Future;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

// Field positions in a `USTA` status line
const FIELD_STATUS: usize = 1;
const FIELD_CLIP: usize = 2;
const FIELD_POSITION: usize = 3;
const FIELD_LENGTH: usize = 8;

/// Reply to one MVCP command
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reply {
	code: u16,
	body: Vec<String>,
}

struct MvcpSession {
	reader: BufReader<OwnedReadHalf>,
	writer: OwnedWriteHalf,
}

impl MvcpSession {
	async fn open(config: &MeltedConfig) -> Result<Self, DriverError> {
		let stream = TcpStream::connect((config.host.as_str(), config.port)).await?;
		stream.set_nodelay(true)?;
		let (read, writer) = stream.into_split();
		let mut session = Self {
			reader: BufReader::new(read),
			writer,
		};

		let greeting = session.read_line().await?;
		if !greeting.starts_with("100") {
			return Err(DriverError::Protocol(format!("unexpected greeting: {greeting}")));
		}
		Ok(session)
	}

	async fn read_line(&mut self) -> Result<String, DriverError> {
		let mut line = String::new();
		if self.reader.read_line(&mut line).await? == 0 {
			return Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "connection closed by server").into());
		}
		Ok(line.trim_end_matches(['\r', '\n']).to_string())
	}

	async fn command(&mut self, command: &str) -> Result<Reply, DriverError> {
		debug!("MVCP >> {}", command);
		self.writer.write_all(format!("{command}\r\n").as_bytes()).await?;
		self.writer.flush().await?;

		let head = self.read_line().await?;
		let code = head
			.split_whitespace()
			.next()
			.and_then(|code| code.parse::<u16>().ok())
			.ok_or_else(|| DriverError::Protocol(format!("malformed reply: {head}")))?;

		let body = match code {
			200 => Vec::new(),
			// single-line body
			202 => vec![self.read_line().await?],
			// multi-line body terminated by an empty line
			201 => {
				let mut lines = Vec::new();
				loop {
					let line = self.read_line().await?;
					if line.is_empty() {
						break lines;
					}
					lines.push(line);
				}
			}
			_ => return Err(DriverError::Rejected(head)),
		};

		debug!("MVCP << {} ({} lines)", code, body.len());
		Ok(Reply { code, body })
	}
}

/// Driver for a melted server speaking MVCP over TCP.
///
/// One command is in flight at a time. A session broken by an I/O error or
/// timeout is dropped and reopened on the next request.
pub struct MeltedDriver {
	config: MeltedConfig,
	session: Mutex<Option<MvcpSession>>,
}

impl MeltedDriver {
	pub fn new(config: MeltedConfig) -> Self {
		Self {
			config,
			session: Mutex::new(None),
		}
	}

	async fn with_timeout<T>(&self, fut: impl Future<Output = Result<T, DriverError>>) -> Result<T, DriverError> {
		tokio::time::timeout(self.config.timeout, fut).await.map_err(|_| DriverError::Timeout(self.config.timeout))?
	}

	async fn request(&self, command: &str) -> Result<Reply, DriverError> {
		let mut guard = self.session.lock().await;
		if guard.is_none() {
			warn!("MVCP session lost, reconnecting to {}:{}", self.config.host, self.config.port);
			*guard = Some(self.with_timeout(MvcpSession::open(&self.config)).await?);
		}
		let session = guard.as_mut().ok_or(DriverError::NotConnected)?;

		match self.with_timeout(session.command(command)).await {
			Ok(reply) => Ok(reply),
			Err(e @ DriverError::Rejected(_)) => Err(e),
			Err(e) => {
				*guard = None;
				Err(e)
			}
		}
	}
}

#[async_trait]
impl PlayoutDriver for MeltedDriver {
	fn name(&self) -> &str {
		MELTED_DRIVER
	}

	async fn connect(&self) -> Result<(), DriverError> {
		let session = self.with_timeout(MvcpSession::open(&self.config)).await?;
		*self.session.lock().await = Some(session);
		info!("🔌 Connected to melted at {}:{}", self.config.host, self.config.port);
		Ok(())
	}

	async fn status(&self) -> Result<RemoteStatus, DriverError> {
		let reply = self.request(&format!("USTA {}", self.config.unit)).await?;
		let line = reply.body.first().ok_or_else(|| DriverError::Protocol(format!("empty status reply ({})", reply.code)))?;
		parse_status(line)
	}

	async fn seek(&self, actual_order: u32, frame: u64) -> Result<(), DriverError> {
		self.request(&format!("GOTO {} {} {}", self.config.unit, frame, actual_order)).await?;
		Ok(())
	}
}

/// Split a status line on whitespace, keeping quoted fields (possibly empty) whole
fn tokenize(line: &str) -> Vec<String> {
	let mut tokens = Vec::new();
	let mut current = String::new();
	let mut quoted = false;
	let mut pending = false;

	for c in line.chars() {
		match c {
			'"' => {
				quoted = !quoted;
				pending = true;
			}
			c if c.is_whitespace() && !quoted => {
				if pending {
					tokens.push(std::mem::take(&mut current));
					pending = false;
				}
			}
			c => {
				current.push(c);
				pending = true;
			}
		}
	}
	if pending {
		tokens.push(current);
	}
	tokens
}

fn parse_status(line: &str) -> Result<RemoteStatus, DriverError> {
	let tokens = tokenize(line);
	let field = |index: usize| tokens.get(index).map(String::as_str).ok_or_else(|| DriverError::Protocol(format!("status line too short: {line}")));
	let number = |index: usize| -> Result<f64, DriverError> {
		let raw = field(index)?;
		raw.parse::<f64>().map_err(|_| DriverError::Protocol(format!("field {index} is not a number: {raw}")))
	};

	let clip = field(FIELD_CLIP)?;
	let id = Path::new(clip).file_stem().and_then(|stem| stem.to_str()).unwrap_or(clip).to_string();

	Ok(RemoteStatus {
		status: PlaybackStatus::from_word(field(FIELD_STATUS)?),
		clip: RemoteClip {
			id,
			current_frame: number(FIELD_POSITION)?,
			length: number(FIELD_LENGTH)?,
		},
	})
}
