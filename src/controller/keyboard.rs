// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::io;
use std::str::FromStr;

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, warn, Level};

use super::Event;
use crate::transport::Quantization;
use crate::PadId;

const PAD: &str = "pad";
const RELEASE: &str = "release";
const SLOT: &str = "slot";
const LOOP: &str = "loop";
const MUTE: &str = "mute";
const SOLO: &str = "solo";
const CLEAR: &str = "clear";
const SCENE: &str = "scene";
const PLAY: &str = "play";
const STOP: &str = "stop";
const BPM: &str = "bpm";
const QUANT: &str = "quant";
const QUIT: &str = "quit";

/// A controller that drives the engine from typed commands.
#[derive(Default)]
pub struct Driver {}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    /// Reads and forwards one command. Returns false once the input is
    /// exhausted or quit was requested.
    fn monitor_io<R, W>(
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<bool, io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(
            writer,
            "Command ({} N, {} N, {} N, {} N, {} N, {} N, {} N, {} N, {}, {}, {} X, {} Q, {}): ",
            PAD, RELEASE, SLOT, LOOP, MUTE, SOLO, CLEAR, SCENE, PLAY, STOP, BPM, QUANT, QUIT,
        )?;
        writer.flush()?;
        let mut input = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Ok(false);
        }

        let event = match parse_command(&input) {
            Some(event) => event,
            None => {
                warn!(input = input.trim(), "Unrecognized input");
                return Ok(true);
            }
        };
        events_tx
            .blocking_send(event)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(event != Event::Quit)
    }
}

/// Parses a command line such as `pad 12` or `quant 1/4`.
pub fn parse_command(input: &str) -> Option<Event> {
    let lowered = input.trim().to_lowercase();
    let mut words = lowered.split_whitespace();
    let command = words.next()?;
    let argument = words.next();
    if words.next().is_some() {
        return None;
    }

    fn index(argument: Option<&str>) -> Option<usize> {
        argument?.parse().ok()
    }
    fn pad(argument: Option<&str>) -> Option<PadId> {
        argument?.parse().ok().map(PadId)
    }

    match (command, argument) {
        (PAD, _) => pad(argument).map(Event::Pad),
        (RELEASE, _) => pad(argument).map(Event::Release),
        (SLOT, _) => index(argument).map(Event::Slot),
        (LOOP, _) => index(argument).map(Event::Loop),
        (MUTE, _) => index(argument).map(Event::Mute),
        (SOLO, _) => index(argument).map(Event::Solo),
        (CLEAR, _) => index(argument).map(Event::Clear),
        (SCENE, _) => index(argument).map(Event::Scene),
        (PLAY, None) => Some(Event::Play),
        (STOP, None) => Some(Event::Stop),
        (BPM, Some(bpm)) => bpm.parse().ok().map(Event::Bpm),
        (QUANT, Some(quantization)) => Quantization::from_str(quantization)
            .ok()
            .map(Event::Quantization),
        (QUIT, None) => Some(Event::Quit),
        _ => None,
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");

            while Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout())? {}
            info!("Keyboard driver stopped.");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, BufReader, BufWriter};

    use tokio::sync::mpsc;

    use super::*;

    fn get_event(input: &str) -> Result<(bool, Option<Event>), io::Error> {
        let (sender, mut receiver) = mpsc::channel::<Event>(1);

        let reader = BufReader::new(input.as_bytes());
        let writer = BufWriter::new(Vec::new());
        let more = Driver::monitor_io(&sender, reader, writer)?;

        // Force the sender to close.
        drop(sender);
        Ok((more, receiver.blocking_recv()))
    }

    #[test]
    fn test_keyboard_events() -> Result<(), io::Error> {
        assert_eq!((true, Some(Event::Pad(PadId(12)))), get_event("pad 12\n")?);
        assert_eq!((true, Some(Event::Release(PadId(3)))), get_event("release 3")?);
        assert_eq!((true, Some(Event::Slot(2))), get_event("SLOT 2")?);
        assert_eq!((true, Some(Event::Loop(0))), get_event("loop 0")?);
        assert_eq!((true, Some(Event::Mute(4))), get_event("mute 4")?);
        assert_eq!((true, Some(Event::Solo(5))), get_event("solo 5")?);
        assert_eq!((true, Some(Event::Clear(1))), get_event("clear 1")?);
        assert_eq!((true, Some(Event::Scene(7))), get_event("scene 7")?);
        assert_eq!((true, Some(Event::Play)), get_event("play")?);
        assert_eq!((true, Some(Event::Stop)), get_event("  stop  ")?);
        assert_eq!((true, Some(Event::Bpm(98.5))), get_event("bpm 98.5")?);
        assert_eq!(
            (true, Some(Event::Quantization(Quantization::Sixteenth))),
            get_event("quant 1/16")?
        );
        assert_eq!((false, Some(Event::Quit)), get_event("quit")?);
        Ok(())
    }

    #[test]
    fn test_unrecognized_and_closed_input() -> Result<(), io::Error> {
        assert_eq!((true, None), get_event("unrecognized")?);
        assert_eq!((true, None), get_event("pad")?);
        assert_eq!((true, None), get_event("pad x")?);
        assert_eq!((true, None), get_event("play now")?);
        assert_eq!((true, None), get_event("slot 1 2")?);
        assert_eq!((false, None), get_event("")?);
        Ok(())
    }
}
