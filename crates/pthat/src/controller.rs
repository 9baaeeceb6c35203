//! PtHat -- async controller tying the command codec to a [`Transport`].
//!
//! The controller renders commands with its [`Header`], writes them, and
//! reads the reply stream through one [`FrameDecoder`] until the sent
//! command's [`Exchange`] reaches the requested [`Await`] level. Frames that
//! belong to something else (late completions, data reports, bare pulse
//! counts) are broadcast as [`PtHatEvent`]s.
//!
//! Only one command is in flight at a time. The transport and the decoder
//! sit behind a single lock, so the pending fragment can never be fed from
//! two readers.

use std::time::Duration;

use tokio::sync::{Mutex, broadcast};
use tokio::time::Instant;
use tracing::{debug, trace};

use pthat_core::error::{Error, Result};
use pthat_core::transport::Transport;
use pthat_core::types::{AdcChannel, Axis, Header, IoPortStatus, PulseCountReport};

use crate::commands::Command;
use crate::events::PtHatEvent;
use crate::exchange::{Await, Exchange};
use crate::protocol::FrameDecoder;
use crate::response::{self, Payload, Response};

/// Bytes requested from the transport per read.
const READ_CHUNK: usize = 256;

struct Link {
    transport: Box<dyn Transport>,
    decoder: FrameDecoder,
}

/// A connected Pulse Train Hat.
///
/// Constructed via [`PtHatBuilder`](crate::builder::PtHatBuilder).
pub struct PtHat {
    link: Mutex<Link>,
    header: Header,
    command_timeout: Duration,
    event_tx: broadcast::Sender<PtHatEvent>,
}

impl PtHat {
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        header: Header,
        command_timeout: Duration,
        event_capacity: usize,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(event_capacity);
        PtHat {
            link: Mutex::new(Link {
                transport,
                decoder: FrameDecoder::new(),
            }),
            header,
            command_timeout,
            event_tx,
        }
    }

    /// The header every command from [`send`](Self::send) and
    /// [`execute`](Self::execute) is rendered with.
    pub fn header(&self) -> Header {
        self.header
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    /// Subscribe to unsolicited frames and connection events.
    pub fn subscribe(&self) -> broadcast::Receiver<PtHatEvent> {
        self.event_tx.subscribe()
    }

    /// Render and write `command` without reading any reply.
    ///
    /// Returns the wire text that was written. A command with an
    /// out-of-range field fails before anything reaches the transport.
    pub async fn send(&self, command: &Command) -> Result<String> {
        let mut link = self.link.lock().await;
        self.write(&mut link, command, self.header).await
    }

    /// Send `command` and read replies until its exchange reaches `wait`.
    pub async fn execute(&self, command: &Command, wait: Await) -> Result<Exchange> {
        self.execute_as(command, self.header, wait).await
    }

    /// Like [`execute`](Self::execute), with an explicit header.
    ///
    /// Distinct ids let a caller tell apart the completions of commands that
    /// share an opcode.
    pub async fn execute_as(
        &self,
        command: &Command,
        header: Header,
        wait: Await,
    ) -> Result<Exchange> {
        let mut link = self.link.lock().await;
        let wire = self.write(&mut link, command, header).await?;

        let mut exchange = Exchange::for_command(command, header);
        let deadline = Instant::now() + self.command_timeout;

        while !exchange.is_satisfied(wait) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!(command = %wire, "PTHat command timed out");
                return Err(Error::Timeout);
            }
            let frames = read_frames(&mut link, remaining).await.inspect_err(|e| {
                debug!(command = %wire, error = %e, "PTHat read failed");
            })?;
            for frame in frames {
                if !exchange.accept(&frame) {
                    self.dispatch(frame);
                }
            }
        }

        Ok(exchange)
    }

    /// Read for up to `timeout` and return every frame that completed.
    ///
    /// Frames returned here are not broadcast. An empty list means nothing
    /// arrived in time; a partial frame stays pending for the next read.
    pub async fn poll(&self, timeout: Duration) -> Result<Vec<Response>> {
        let mut link = self.link.lock().await;
        let deadline = Instant::now() + timeout;
        let mut responses = Vec::new();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match read_frames(&mut link, remaining).await {
                Ok(frames) => responses.extend(frames),
                Err(Error::Timeout) => break,
                Err(e) => return Err(e),
            }
        }

        Ok(responses)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub async fn firmware_version(&self) -> Result<String> {
        match self.query(Command::RequestFirmwareVersion).await? {
            Payload::Firmware(version) => Ok(version),
            other => Err(unexpected_payload("firmware version", &other)),
        }
    }

    /// Raw reading of one ADC input.
    pub async fn adc_reading(&self, channel: AdcChannel) -> Result<u32> {
        match self.query(Command::RequestAdcReading(channel)).await? {
            Payload::Adc(value) => Ok(value),
            other => Err(unexpected_payload("ADC reading", &other)),
        }
    }

    pub async fn current_pulse_count(&self, axis: Axis) -> Result<PulseCountReport> {
        match self.query(Command::RequestPulseCount(axis)).await? {
            Payload::PulseCount(report) => Ok(report),
            other => Err(unexpected_payload("pulse count", &other)),
        }
    }

    /// Emergency-stop and limit-switch input states.
    pub async fn io_port_status(&self) -> Result<IoPortStatus> {
        match self.query(Command::RequestPortStatus).await? {
            Payload::PortStatus(status) => Ok(status),
            other => Err(unexpected_payload("port status", &other)),
        }
    }

    async fn query(&self, command: Command) -> Result<Payload> {
        let exchange = self.execute(&command, Await::Received).await?;
        Ok(exchange.into_payload())
    }

    // -----------------------------------------------------------------------
    // Connection
    // -----------------------------------------------------------------------

    /// Reset the board (`N*`) and discard any partial frame.
    pub async fn reset(&self) -> Result<()> {
        self.send(&Command::Reset).await.map(|_| ())
    }

    pub async fn close(&self) -> Result<()> {
        let mut link = self.link.lock().await;
        link.transport.close().await?;
        link.decoder.reset();
        let _ = self.event_tx.send(PtHatEvent::Disconnected);
        Ok(())
    }

    pub async fn is_connected(&self) -> bool {
        self.link.lock().await.transport.is_connected()
    }

    async fn write(&self, link: &mut Link, command: &Command, header: Header) -> Result<String> {
        let wire = command.render(header)?;
        debug!(command = %wire, "sending PTHat command");
        link.transport.send(wire.as_bytes()).await?;

        if matches!(command, Command::Reset) {
            link.decoder.reset();
            let _ = self.event_tx.send(PtHatEvent::Reset);
        }
        Ok(wire)
    }

    fn dispatch(&self, frame: Response) {
        debug!(frame = %frame, "unsolicited PTHat frame");
        let _ = self.event_tx.send(PtHatEvent::from(frame));
    }
}

/// One transport read, fed through the decoder and classified.
async fn read_frames(link: &mut Link, wait: Duration) -> Result<Vec<Response>> {
    let mut buf = [0u8; READ_CHUNK];
    let n = match tokio::time::timeout(wait, link.transport.receive(&mut buf, wait)).await {
        Ok(Ok(0)) => return Err(Error::ConnectionLost),
        Ok(Ok(n)) => n,
        Ok(Err(e)) => return Err(e),
        Err(_) => return Err(Error::Timeout),
    };

    let frames = link
        .decoder
        .feed(&buf[..n])
        .into_iter()
        .map(|text| {
            let frame = response::classify(&text);
            trace!(raw = %text, frame = ?frame, "PTHat frame");
            frame
        })
        .collect();
    Ok(frames)
}

fn unexpected_payload(what: &str, payload: &Payload) -> Error {
    Error::Protocol(format!("expected {what}, got {payload:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{AxisConfig, BufferOp};
    use crate::response::ReplyClass;
    use pthat_core::types::{AxisSelector, CommandId, CommandMode, Direction};
    use pthat_test_harness::{MockHandle, MockTransport};

    fn make_test_pthat(mock: MockTransport) -> (PtHat, MockHandle) {
        let handle = mock.handle();
        let pthat = PtHat::new(
            Box::new(mock),
            Header::default(),
            Duration::from_millis(200),
            16,
        );
        (pthat, handle)
    }

    fn with_id(mock: MockTransport, id: u8) -> PtHat {
        let header = Header::new(CommandMode::Instant, CommandId::new(id).unwrap());
        PtHat::new(Box::new(mock), header, Duration::from_millis(200), 16)
    }

    // -----------------------------------------------------------------------
    // send
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_send_renders_with_header() {
        let mut mock = MockTransport::new();
        mock.expect(b"I07SX*", b"");
        let pthat = with_id(mock, 7);

        let wire = pthat.send(&Command::Start(Axis::X.into())).await.unwrap();
        assert_eq!(wire, "I07SX*");
    }

    #[tokio::test]
    async fn test_send_rejects_invalid_command_before_writing() {
        let (pthat, handle) = make_test_pthat(MockTransport::new());
        let cmd = Command::ChangeSpeed {
            axis: Axis::X,
            frequency: 200_000.0,
        };
        let result = pthat.send(&cmd).await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(handle.sent_data().is_empty());
    }

    // -----------------------------------------------------------------------
    // execute
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_execute_waits_for_received() {
        let mut mock = MockTransport::new();
        mock.expect(
            b"I00CX001000.000000000100000000000000*",
            b"RI00CX*",
        );
        let (pthat, _) = make_test_pthat(mock);

        let cmd = Command::ConfigureAxis {
            axis: Axis::X,
            config: AxisConfig {
                frequency: 1000.0,
                pulse_count: 1000,
                ..AxisConfig::default()
            },
        };
        let exchange = pthat.execute(&cmd, Await::Received).await.unwrap();
        assert!(exchange.is_received());
        assert!(!exchange.is_completed());
    }

    #[tokio::test]
    async fn test_execute_completed_byte_at_a_time() {
        let mut mock = MockTransport::new();
        mock.set_chunk_size(1);
        mock.expect(b"I00SX*", b"RI00SX*CI00SX*");
        let (pthat, _) = make_test_pthat(mock);

        let exchange = pthat
            .execute(&Command::Start(Axis::X.into()), Await::Completed)
            .await
            .unwrap();
        assert!(exchange.is_received());
        assert!(exchange.is_completed());
    }

    #[tokio::test]
    async fn test_execute_times_out_without_completion() {
        let mut mock = MockTransport::new();
        mock.expect(b"I00SA*", b"RI00SA*");
        let (pthat, _) = make_test_pthat(mock);

        let result = pthat
            .execute(&Command::Start(AxisSelector::All), Await::Completed)
            .await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn test_execute_nothing_returns_after_write() {
        let mut mock = MockTransport::new();
        mock.expect(b"I00TA*", b"");
        let (pthat, handle) = make_test_pthat(mock);

        let exchange = pthat
            .execute(&Command::Stop(AxisSelector::All), Await::Nothing)
            .await
            .unwrap();
        assert!(!exchange.is_received());
        assert_eq!(handle.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn test_execute_headerless_buffer_command() {
        let mut mock = MockTransport::new();
        mock.expect(b"H0000*", b"");
        let (pthat, _) = make_test_pthat(mock);

        let exchange = pthat
            .execute(&Command::Buffer(BufferOp::Initiate), Await::Completed)
            .await
            .unwrap();
        assert_eq!(exchange.opcode(), None);
    }

    #[tokio::test]
    async fn test_execute_as_uses_given_header() {
        let mut mock = MockTransport::new();
        mock.expect(b"B12SY*", b"RB12SY*");
        let (pthat, _) = make_test_pthat(mock);

        let header = Header::new(CommandMode::Buffered, CommandId::new(12).unwrap());
        let exchange = pthat
            .execute_as(&Command::Start(Axis::Y.into()), header, Await::Received)
            .await
            .unwrap();
        assert_eq!(exchange.id().value(), 12);
    }

    #[tokio::test]
    async fn test_execute_propagates_disconnect() {
        let mut mock = MockTransport::new();
        mock.set_connected(false);
        let (pthat, _) = make_test_pthat(mock);

        let result = pthat.execute(&Command::ToggleMotorEnable, Await::Received).await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_firmware_version_any_chunk_size() {
        let stream = b"RI00FW**PTHAT 5.3*CI00FW*";
        for chunk in 1..=stream.len() {
            let mut mock = MockTransport::new();
            mock.set_chunk_size(chunk);
            mock.expect(b"I00FW*", stream);
            let (pthat, _) = make_test_pthat(mock);

            let version = pthat.firmware_version().await.unwrap();
            assert_eq!(version, "PTHAT 5.3", "chunk size {chunk}");
        }
    }

    #[tokio::test]
    async fn test_adc_reading_embedded() {
        let mut mock = MockTransport::new();
        mock.expect(b"I00D1*", b"RI00D10512*CI00D1*");
        let (pthat, _) = make_test_pthat(mock);

        assert_eq!(pthat.adc_reading(AdcChannel::Adc1).await.unwrap(), 512);
    }

    #[tokio::test]
    async fn test_adc_reading_malformed_is_protocol_error() {
        let mut mock = MockTransport::new();
        mock.expect(b"I00D2*", b"RI00D2abc*");
        let (pthat, _) = make_test_pthat(mock);

        let result = pthat.adc_reading(AdcChannel::Adc2).await;
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn test_current_pulse_count() {
        let mut mock = MockTransport::new();
        mock.expect(b"I01XP*", b"RI01XP*XP10000001000*CI01XP*");
        let pthat = with_id(mock, 1);

        let report = pthat.current_pulse_count(Axis::X).await.unwrap();
        assert_eq!(
            report,
            PulseCountReport {
                axis: Axis::X,
                direction: Direction::Reverse,
                count: 1000,
            }
        );
    }

    #[tokio::test]
    async fn test_io_port_status() {
        let mut mock = MockTransport::new();
        mock.expect(b"I00LI*", b"RI00LI*L00100*CI00LI*");
        let (pthat, _) = make_test_pthat(mock);

        let status = pthat.io_port_status().await.unwrap();
        assert!(status.y_limit);
        assert!(!status.emergency_stop);
        assert!(!status.x_limit);
    }

    #[tokio::test]
    async fn test_stale_frame_before_reply_is_not_the_answer() {
        let mut mock = MockTransport::new();
        mock.expect(b"I00FW*", b"RI00FW**PTHAT 5.3*");
        let (pthat, handle) = make_test_pthat(mock);
        let mut rx = pthat.subscribe();
        handle.push(b"0512*");

        assert_eq!(pthat.firmware_version().await.unwrap(), "PTHAT 5.3");
        assert!(matches!(
            rx.try_recv().unwrap(),
            PtHatEvent::Unrecognized { frame } if frame == "0512"
        ));
    }

    #[tokio::test]
    async fn test_query_without_reply_times_out() {
        let mut mock = MockTransport::new();
        mock.expect(b"I00FW*", b"");
        let (pthat, _) = make_test_pthat(mock);

        assert!(matches!(pthat.firmware_version().await, Err(Error::Timeout)));
    }

    // -----------------------------------------------------------------------
    // Events and polling
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_unrelated_frames_are_broadcast() {
        let mut mock = MockTransport::new();
        mock.expect(b"I00SY*", b"CI00SX*DI00JX*XP00000000042*RI00SY*");
        let (pthat, _) = make_test_pthat(mock);
        let mut rx = pthat.subscribe();

        pthat
            .execute(&Command::Start(Axis::Y.into()), Await::Received)
            .await
            .unwrap();

        match rx.try_recv().unwrap() {
            PtHatEvent::Reply { reply } => {
                assert_eq!(reply.class, ReplyClass::Completed);
                assert_eq!(reply.opcode, Some(crate::opcode::Opcode::Start(Axis::X.into())));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(rx.try_recv().unwrap(), PtHatEvent::Data { .. }));
        assert!(matches!(
            rx.try_recv().unwrap(),
            PtHatEvent::PulseCount { report } if report.count == 42
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_poll_returns_pushed_frames() {
        let (pthat, handle) = make_test_pthat(MockTransport::new());
        handle.push(b"XP00000000005*L10000*");

        let frames = pthat.poll(Duration::from_millis(20)).await.unwrap();
        assert_eq!(frames.len(), 2);
        assert!(matches!(frames[0], Response::PulseCount(r) if r.count == 5));
        assert!(matches!(frames[1], Response::PortStatus(s) if s.emergency_stop));

        assert!(pthat.poll(Duration::from_millis(20)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_poll_keeps_partial_frame() {
        let (pthat, handle) = make_test_pthat(MockTransport::new());
        handle.push(b"CI00S");
        assert!(pthat.poll(Duration::from_millis(20)).await.unwrap().is_empty());

        handle.push(b"X*");
        let frames = pthat.poll(Duration::from_millis(20)).await.unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].to_string(), "CI00SX");
    }

    #[tokio::test]
    async fn test_late_completion_reaches_poll() {
        let mut mock = MockTransport::new();
        mock.set_chunk_size(1);
        mock.expect(b"I00FW*", b"RI00FW**1.0*CI00FW*");
        let (pthat, _) = make_test_pthat(mock);

        assert_eq!(pthat.firmware_version().await.unwrap(), "1.0");
        let frames = pthat.poll(Duration::from_millis(20)).await.unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].to_string(), "CI00FW");
    }

    // -----------------------------------------------------------------------
    // Connection
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_reset_clears_partial_frame() {
        let mut mock = MockTransport::new();
        mock.expect(b"N*", b"");
        let (pthat, handle) = make_test_pthat(mock);
        let mut rx = pthat.subscribe();

        handle.push(b"RI00S");
        assert!(pthat.poll(Duration::from_millis(20)).await.unwrap().is_empty());

        pthat.reset().await.unwrap();
        assert!(matches!(rx.try_recv().unwrap(), PtHatEvent::Reset));

        handle.push(b"CI00SX*");
        let frames = pthat.poll(Duration::from_millis(20)).await.unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].to_string(), "CI00SX");
        assert_eq!(handle.sent_text(), vec!["N*".to_string()]);
    }

    #[tokio::test]
    async fn test_close_broadcasts_disconnect() {
        let (pthat, handle) = make_test_pthat(MockTransport::new());
        let mut rx = pthat.subscribe();
        assert!(pthat.is_connected().await);

        pthat.close().await.unwrap();
        assert!(!pthat.is_connected().await);
        assert!(!handle.is_connected());
        assert!(matches!(rx.try_recv().unwrap(), PtHatEvent::Disconnected));

        let result = pthat.send(&Command::ToggleMotorEnable).await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }
}
