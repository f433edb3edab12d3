use std::io::{self, Read, Write};
use std::{env, time::Duration};

use radiofec::link::{
    receive_payload, transmit_payload, BulkFrame, ExchangeError, LinkError, RadioLink,
    BULK_FRAME_LEN,
};
use radiofec::{append_trailer, verify_trailer, FecConfig, FrameCodec};
use serialport::SerialPort;

/// Bulk records carried over a serial port, one 512-byte record per frame.
struct SerialLink {
    port: Box<dyn SerialPort>,
}

fn device_error(err: io::Error) -> LinkError {
    match err.kind() {
        io::ErrorKind::TimedOut => LinkError::Timeout,
        _ => LinkError::Device,
    }
}

impl RadioLink for SerialLink {
    fn transmit(&mut self, data: &[u8]) -> Result<(), LinkError> {
        let mut buf = [0; BULK_FRAME_LEN];
        BulkFrame::new(data)?.dump(&mut buf);
        self.port.write_all(&buf).map_err(device_error)
    }

    fn receive(&mut self) -> Result<BulkFrame, LinkError> {
        let mut buf = [0; BULK_FRAME_LEN];
        self.port.read_exact(&mut buf).map_err(device_error)?;
        BulkFrame::parse(&buf)
    }
}

fn main() {
    let path = env::args().nth(1).expect("no serial port supplied");
    let port = serialport::new(path, 115_200)
        .timeout(Duration::from_millis(500))
        .open()
        .expect("failed to open serial port");
    let mut link = SerialLink { port };

    let codec = FrameCodec::new();
    let config = FecConfig::default();

    if let Some(message) = env::args().nth(2) {
        let mut data = Vec::with_capacity(message.len() + 2);
        let len = u16::try_from(message.len()).expect("message too long");
        data.extend_from_slice(&len.to_be_bytes());
        data.extend_from_slice(message.as_bytes());
        let payload = append_trailer(&data).expect("message too long");
        transmit_payload(&mut link, &codec, &payload, config).expect("failed to send message");
    }

    loop {
        match receive_payload(&mut link, &codec, config) {
            Ok((deframed, frame)) => {
                println!(
                    "rssi {} freq {} bits corrected {:?} symbols corrected {:?}",
                    frame.rssi,
                    frame.freq,
                    deframed.stats.bit_corrections,
                    deframed.stats.symbol_corrections
                );
                match verify_trailer(&deframed.payload) {
                    Ok(message) => println!("{:02x?}", message.as_slice()),
                    Err(err) => eprintln!("{err}"),
                }
            }
            Err(ExchangeError::Link {
                source: LinkError::Timeout,
            }) => (),
            Err(ExchangeError::Fec { source }) => eprintln!("{source}"),
            Err(e) => {
                eprintln!("{}", e);
                break;
            }
        }
    }
}
