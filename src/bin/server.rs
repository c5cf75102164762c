use std::fs::File;
use std::process;

use log::{error, info};

use slipstream::sender::{self, Sender};
use slipstream::DEFAULT_RWND;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let port: u16 = match args.next().and_then(|arg| arg.parse().ok()) {
        Some(port) => port,
        None => {
            eprintln!("usage: server <port>");
            process::exit(1);
        }
    };

    let socket = match sender::bind(port) {
        Ok(socket) => socket,
        Err(err) => {
            error!("{}", err);
            process::exit(1);
        }
    };
    info!("Serving on 127.0.0.1:{}", port);

    let (file_name, peer) = match sender::get_request(&socket) {
        Ok(request) => request,
        Err(err) => {
            error!("{}", err);
            process::exit(1);
        }
    };

    let file = match File::open(&file_name) {
        Ok(file) => file,
        Err(err) => {
            error!("Opening {:?} failed: {}", file_name, err);
            let _ = sender::send_error(&socket, peer);
            process::exit(1);
        }
    };

    let outcome = Sender::new(socket, peer, file, DEFAULT_RWND).and_then(|mut sender| sender.run());
    if let Err(err) = outcome {
        error!("Transfer failed: {}", err);
        process::exit(1);
    }
}
