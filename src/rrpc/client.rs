use std::fs;
use std::net::TcpStream;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rand::Rng;

use crate::err::RrpcError;

use super::message::{self, Message, AGREE, REVERSE_ANSWER, REVERSE_REQUEST};

#[derive(Debug, Clone)]
pub struct RrpcClientConfig {
    pub host: String,
    pub port: u16,
    pub l_min: u32,
    pub l_max: u32,
    pub input_file: PathBuf,
}

// Chunk length is drawn uniformly from [l_min, l_max] and capped at the
// remaining byte count, so the final chunk is often shorter than l_min.
fn chunk(data: &[u8], l_min: u32, l_max: u32) -> Vec<Vec<u8>> {
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut rng = rand::thread_rng();

    while start < data.len() {
        let remaining = data.len() - start;
        let proposed = rng.gen_range(l_min..=l_max) as usize;
        let len = proposed.min(remaining);
        chunks.push(data[start..start + len].to_vec());
        start += len;
    }

    chunks
}

// Runs the full reverse-chunk exchange against the server and writes
// `<input_basename>_reversed.txt`.
pub fn run(config: &RrpcClientConfig) -> Result<PathBuf, RrpcError> {
    let data = fs::read(&config.input_file)?;
    message::validate_ascii(&data)?;

    let chunks = chunk(&data, config.l_min, config.l_max);
    let chunks_num = chunks.len() as u32;
    info!(
        "split {} bytes into {chunks_num} chunk(s)",
        data.len()
    );

    let mut stream = TcpStream::connect((config.host.as_str(), config.port))?;

    message::write_initialization(&mut stream, chunks_num)?;
    debug!("sent Initialization, chunks_num={chunks_num}");

    let agree = message::read_message(&mut stream)?;
    if agree.msg_type != AGREE {
        return Err(RrpcError::UnexpectedType(agree.msg_type));
    }

    let mut reversed_chunks = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        message::write_message(&mut stream, &Message::new(REVERSE_REQUEST, chunk.clone()))?;

        let answer = message::read_message(&mut stream)?;
        if answer.msg_type != REVERSE_ANSWER {
            return Err(RrpcError::UnexpectedType(answer.msg_type));
        }
        if answer.payload.len() != chunk.len() {
            return Err(RrpcError::LengthMismatch {
                expected: chunk.len() as u32,
                got: answer.payload.len() as u32,
            });
        }

        reversed_chunks.push(answer.payload);
    }

    // Concatenating answers in reverse order of arrival mirrors whole-file
    // reversal.
    reversed_chunks.reverse();
    let full_reversed: Vec<u8> = reversed_chunks.concat();

    let output_path = output_path_for(&config.input_file);
    fs::write(&output_path, &full_reversed)?;
    info!("wrote {}", output_path.display());

    Ok(output_path)
}

fn output_path_for(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let mut out = input.to_path_buf();
    out.set_file_name(format!("{}_reversed.txt", stem.to_string_lossy()));
    out
}
