//! Blocking HTTP fetch for remote datasets.

use std::io::{self, Read};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result, bail};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound for a downloaded dataset. The red-wine CSV is ~100 KiB.
pub const MAX_DATASET_BYTES: usize = 64 * 1024 * 1024;

/// Whether `location` should be fetched over the network.
pub fn is_remote(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Return a shared HTTP agent with consistent timeouts.
fn agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .build()
    })
}

/// GET `url` once and return the body. Non-2xx statuses are errors.
pub fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    log::debug!("GET {url}");
    let response = match agent().get(url).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(code, _)) => bail!("server answered HTTP {code}"),
        Err(err) => return Err(err).context("request failed"),
    };
    let bytes = read_response_bytes(response, MAX_DATASET_BYTES).context("reading body")?;
    log::debug!("received {} bytes from {url}", bytes.len());
    Ok(bytes)
}

/// Read a response into memory, enforcing a maximum byte size.
fn read_response_bytes(response: ureq::Response, max_bytes: usize) -> Result<Vec<u8>, io::Error> {
    if let Some(length) = response
        .header("Content-Length")
        .and_then(|l| l.parse::<u64>().ok())
    {
        if length > max_bytes as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Response too large: {length} bytes"),
            ));
        }
    }
    let mut limited = response.into_reader().take(max_bytes as u64 + 1);
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes)?;
    if bytes.len() > max_bytes {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Response exceeded {max_bytes} bytes"),
        ));
    }
    Ok(bytes)
}
