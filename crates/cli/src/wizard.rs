//! Interactive link configuration
//!
//! Line-based prompts on stdin/stdout, run before the terminal switches to
//! the alternate screen. An empty answer, `q`, or end of input aborts.

use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};
use circuit_echo_core::link::BAUD_RATES;
use circuit_echo_core::{LinkConfig, Parity};

const DATA_BITS: [u8; 4] = [5, 6, 7, 8];
const STOP_BITS: [u8; 2] = [1, 2];

/// Names of the serial ports the driver can see
pub fn list_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports().context("failed to enumerate serial ports")?;
    if ports.is_empty() {
        bail!("no serial ports found");
    }
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// Ask for every link parameter in turn
///
/// Returns `Ok(None)` when the user aborts. Answers that are not one of the
/// offered choices are asked again; a custom baud rate that is not a
/// positive integer is an error.
pub fn run_wizard<R, W>(ports: &[String], input: &mut R, output: &mut W) -> Result<Option<LinkConfig>>
where
    R: BufRead,
    W: Write,
{
    let Some(port) = select_port(ports, input, output)? else {
        return Ok(None);
    };
    let Some(baud_rate) = select_baud(input, output)? else {
        return Ok(None);
    };
    let Some(data_bits) = select_value("Data Bits", &DATA_BITS, input, output)? else {
        return Ok(None);
    };
    let Some(stop_bits) = select_value("Stop Bits", &STOP_BITS, input, output)? else {
        return Ok(None);
    };
    let Some(parity) = select_parity(input, output)? else {
        return Ok(None);
    };

    Ok(Some(LinkConfig::new(port, baud_rate, data_bits, stop_bits, parity)))
}

/// Print `prompt` and read one trimmed answer; `None` means abort
fn ask<R: BufRead, W: Write>(prompt: &str, input: &mut R, output: &mut W) -> Result<Option<String>> {
    write!(output, "{}: ", prompt)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }

    let answer = line.trim();
    if answer.is_empty() || answer.eq_ignore_ascii_case("q") {
        return Ok(None);
    }
    Ok(Some(answer.to_string()))
}

fn select_port<R: BufRead, W: Write>(
    ports: &[String],
    input: &mut R,
    output: &mut W,
) -> Result<Option<String>> {
    writeln!(output, "Select Serial Port")?;
    for (i, port) in ports.iter().enumerate() {
        writeln!(output, "  {}) {}", i + 1, port)?;
    }

    loop {
        let Some(answer) = ask("Port", input, output)? else {
            return Ok(None);
        };

        let by_index = answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| ports.get(i));
        let by_name = ports.iter().find(|p| **p == answer);

        match by_index.or(by_name) {
            Some(port) => return Ok(Some(port.clone())),
            None => writeln!(output, "Invalid choice '{}'", answer)?,
        }
    }
}

fn select_baud<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Option<u32>> {
    writeln!(output, "Select Baud Rate")?;
    for (i, rate) in BAUD_RATES.iter().enumerate() {
        writeln!(output, "  {}) {}", i + 1, rate)?;
    }
    let custom = BAUD_RATES.len() + 1;
    writeln!(output, "  {}) Custom", custom)?;

    loop {
        let Some(answer) = ask("Baud rate", input, output)? else {
            return Ok(None);
        };

        match answer.parse::<usize>() {
            Ok(n) if n == custom => break,
            Ok(n) if (1..custom).contains(&n) => return Ok(Some(BAUD_RATES[n - 1])),
            _ => writeln!(output, "Invalid choice '{}'", answer)?,
        }
    }

    let Some(answer) = ask("Enter custom baud rate", input, output)? else {
        return Ok(None);
    };
    match answer.parse::<u32>() {
        Ok(rate) if rate > 0 => Ok(Some(rate)),
        _ => bail!("invalid custom baud rate"),
    }
}

fn select_value<R: BufRead, W: Write>(
    title: &str,
    choices: &[u8],
    input: &mut R,
    output: &mut W,
) -> Result<Option<u8>> {
    let options: Vec<String> = choices.iter().map(u8::to_string).collect();
    let prompt = format!("{} [{}]", title, options.join("/"));

    loop {
        let Some(answer) = ask(&prompt, input, output)? else {
            return Ok(None);
        };

        match answer.parse::<u8>() {
            Ok(value) if choices.contains(&value) => return Ok(Some(value)),
            _ => writeln!(output, "Invalid choice '{}'", answer)?,
        }
    }
}

fn select_parity<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Option<Parity>> {
    let options: Vec<String> = Parity::SUPPORTED
        .iter()
        .map(|p| format!("{}={}", p.code(), p))
        .collect();
    let prompt = format!("Parity [{}]", options.join(", "));

    loop {
        let Some(answer) = ask(&prompt, input, output)? else {
            return Ok(None);
        };

        match answer.parse::<Parity>() {
            Ok(parity) if parity.is_supported() => return Ok(Some(parity)),
            Ok(parity) => writeln!(output, "Parity {} is not supported by this driver", parity)?,
            Err(_) => writeln!(output, "Invalid choice '{}'", answer)?,
        }
    }
}
