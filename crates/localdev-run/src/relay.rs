use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;

/// Attach line relays to a child's stdout and stderr.
///
/// Each stream is drained by its own task so neither can block the other;
/// the tasks end on their own when the streams reach EOF, which happens when
/// the child exits. Lines from the two streams may interleave — each printed
/// line is atomic, but no relative ordering is guaranteed.
pub fn attach(child: &mut Child, name: &str) {
	if let Some(stdout) = child.stdout.take() {
		let prefix = name.to_string();
		tokio::spawn(async move {
			pipe_lines(stdout, &prefix).await;
		});
	}
	if let Some(stderr) = child.stderr.take() {
		let prefix = name.to_string();
		tokio::spawn(async move {
			pipe_lines(stderr, &prefix).await;
		});
	}
}

async fn pipe_lines<R: AsyncRead + Unpin>(reader: R, prefix: &str) {
	let mut reader = BufReader::new(reader);
	let mut buf: Vec<u8> = Vec::with_capacity(256);
	loop {
		buf.clear();
		match reader.read_until(b'\n', &mut buf).await {
			Ok(0) => break,
			Ok(_) => println!("{}", format_line(prefix, &buf)),
			Err(_) => break,
		}
	}
}

/// Render one raw output line as `[<name>] <line>`. Decoding is best-effort:
/// malformed byte sequences are replaced, never an error.
pub fn format_line(prefix: &str, raw: &[u8]) -> String {
	let line = String::from_utf8_lossy(raw);
	format!("[{}] {}", prefix, line.trim_end_matches(['\r', '\n']))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn format_line_prefixes_and_trims() {
		assert_eq!(format_line("web", b"hello\n"), "[web] hello");
		assert_eq!(format_line("web", b"hello\r\n"), "[web] hello");
		assert_eq!(format_line("web", b"no newline"), "[web] no newline");
	}

	#[test]
	fn format_line_survives_invalid_utf8() {
		let rendered = format_line("web", &[0xff, 0xfe, b'o', b'k', b'\n']);
		assert!(rendered.starts_with("[web] "));
		assert!(rendered.ends_with("ok"));
	}
}
