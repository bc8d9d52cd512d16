use std::collections::VecDeque;
use std::convert::Infallible;
use color_eyre::eyre::{bail, eyre, WrapErr};
use color_eyre::Result;
use tact_sys::input::WIRE_BYTES;
use tact_sys::{TouchEvent, TouchInput, Wait};

/// A recorded touch trace, played back as a [TouchInput]. Once the trace runs out every wait
/// is cancelled.
#[derive(Debug, Default)]
pub struct TraceInput {
    events: VecDeque<Wait<TouchEvent>>,
}

impl TraceInput {
    /// Parse a text trace. Each line is either `x y pressure valid`, or `timeout`. Blank lines
    /// and anything after a `#` are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let mut events = VecDeque::new();

        for (n, line) in text.lines().enumerate() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let event = parse_line(line).wrap_err_with(|| format!("trace line {}", n + 1))?;
            events.push_back(event);
        }

        Ok(Self { events })
    }

    /// Decode a binary trace of back-to-back wire-format samples.
    pub fn from_wire(data: &[u8]) -> Result<Self> {
        if data.len() % WIRE_BYTES != 0 {
            bail!("binary trace length {} is not a multiple of {WIRE_BYTES}", data.len());
        }

        let events = data
            .chunks_exact(WIRE_BYTES)
            .enumerate()
            .map(|(n, chunk)| {
                TouchEvent::from_wire(chunk)
                    .map(Wait::Ready)
                    .ok_or_else(|| eyre!("sample {n} has an invalid validity byte"))
            })
            .collect::<Result<_>>()?;

        Ok(Self { events })
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl TouchInput for TraceInput {
    type Error = Infallible;

    fn wait_for_event(&mut self) -> Result<Wait<TouchEvent>, Infallible> {
        Ok(self.events.pop_front().unwrap_or(Wait::Cancelled))
    }
}

fn parse_line(line: &str) -> Result<Wait<TouchEvent>> {
    if line == "timeout" {
        return Ok(Wait::TimedOut);
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    let [x, y, pressure, valid] = fields[..] else {
        bail!("expected `x y pressure valid`, got {} fields", fields.len());
    };

    let valid = match valid {
        "1" | "true" => true,
        "0" | "false" => false,
        other => bail!("invalid validity flag `{other}`"),
    };

    Ok(Wait::Ready(TouchEvent {
        x: x.parse().wrap_err("x")?,
        y: y.parse().wrap_err("y")?,
        pressure: pressure.parse().wrap_err("pressure")?,
        valid,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_trace() {
        let mut input = TraceInput::parse(
            "# press the red button\n\
             40 420 30 1\n\
             \n\
             timeout\n\
             65535 65535 0 false   # pen up\n",
        )
        .unwrap();

        assert_eq!(input.remaining(), 3);
        assert_eq!(input.wait_for_event().unwrap(), Wait::Ready(TouchEvent::new(40, 420, 30)));
        assert_eq!(input.wait_for_event().unwrap(), Wait::TimedOut);
        assert_eq!(input.wait_for_event().unwrap(), Wait::Ready(TouchEvent::released()));
        assert_eq!(input.wait_for_event().unwrap(), Wait::Cancelled);
    }

    #[test]
    fn text_trace_errors_name_the_line() {
        let err = TraceInput::parse("1 2 3 1\n1 2 3\n").unwrap_err();
        assert_eq!(err.to_string(), "trace line 2");

        assert!(TraceInput::parse("1 2 3 yes").is_err());
        assert!(TraceInput::parse("1 -2 3 1").is_err());
    }

    #[test]
    fn binary_trace() {
        let mut data = TouchEvent::new(100, 200, 7).to_wire().to_vec();
        data.extend_from_slice(&TouchEvent::released().to_wire());

        let mut input = TraceInput::from_wire(&data).unwrap();
        assert_eq!(input.wait_for_event().unwrap(), Wait::Ready(TouchEvent::new(100, 200, 7)));
        assert_eq!(input.wait_for_event().unwrap(), Wait::Ready(TouchEvent::released()));

        assert!(TraceInput::from_wire(&data[..10]).is_err());
        data[8] = 9;
        assert!(TraceInput::from_wire(&data).is_err());
    }
}
