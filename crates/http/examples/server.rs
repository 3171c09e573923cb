use std::io;
use std::net::{TcpListener, TcpStream};
use std::thread;

use media_http::connection::{write_error, HttpResponseWriter, MessageParser, ResponseWriter};
use media_http::protocol::{HttpError, Message, SendError};
use serde_json::{json, Map};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> io::Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!(port = 8080, "start listening");
    let tcp_listener = match TcpListener::bind("127.0.0.1:8080") {
        Ok(tcp_listener) => tcp_listener,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return Err(e);
        }
    };

    loop {
        let (tcp_stream, remote_addr) = match tcp_listener.accept() {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        thread::spawn(move || match serve(tcp_stream) {
            Ok(()) => info!(%remote_addr, "finished process, connection shutdown"),
            Err(e) => error!(%remote_addr, cause = %e, "service has error, connection shutdown"),
        });
    }
}

fn serve(mut stream: TcpStream) -> Result<(), HttpError> {
    let mut parser = MessageParser::new();

    loop {
        let sink = stream.try_clone().map_err(SendError::io)?;
        let mut writer = HttpResponseWriter::new(sink).with_server("media-http-demo");

        let message = match parser.parse(&mut stream) {
            Ok(message) => message,
            Err(e) if e.is_closed() => return Ok(()),
            Err(e) => {
                warn!(cause = %e, "can't receive next request");
                write_error(&mut writer, e.status_code())?;
                return Err(e.into());
            }
        };

        let body = parser.body(&mut stream).read_all()?;
        info!(method = %message.method(), url = message.url(), body_len = body.len(), "receive request");

        handle(&message, &mut writer)?;

        if !message.is_keep_alive() {
            return Ok(());
        }
    }
}

fn handle<W: ResponseWriter>(message: &Message, writer: &mut W) -> Result<(), HttpError> {
    if !message.is_http_get() {
        write_error(writer, 405)?;
        return Ok(());
    }

    match message.path() {
        "/api/v1/headers" => {
            let mut headers = Map::new();
            message.headers().dump(&mut headers);

            let body = json!({ "code": 0, "data": { "url": message.url(), "headers": headers } }).to_string();
            writer.header().set_content_type("application/json");
            writer.header().set_content_length(body.len() as u64);
            writer.write(body.as_bytes())?;
            writer.final_request()?;
        }
        "/" => {
            writer.write(b"Hello World!")?;
            writer.final_request()?;
        }
        _ => write_error(writer, 404)?,
    }

    Ok(())
}
