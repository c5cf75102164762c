use std::fs;
use std::path::Path;
use std::process;

use log::error;

use slipstream::receiver::{FaultInjector, Receiver, CLIENT_FILE_PATH};

fn usage() -> ! {
    eprintln!(
        "usage: client <server-ip> <server-port> <file-name> \
         <receiver-window> <control-param> <drop-or-delay-percent>"
    );
    process::exit(1);
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 7 {
        usage();
    }

    let host = &args[1];
    let Ok(port) = args[2].parse::<u16>() else { usage() };
    let file_name = &args[3];
    let Ok(rwnd) = args[4].parse::<u64>() else { usage() };
    let Ok(control) = args[5].parse::<u32>() else { usage() };
    let Ok(percent) = args[6].parse::<u32>() else { usage() };

    let Some(fault) = FaultInjector::from_control(control, percent) else {
        eprintln!("control-param must be 0 (none), 1 (drop), 2 (delay) or 3 (both)");
        process::exit(1);
    };

    let mut receiver = match Receiver::connect(host, port, rwnd, fault) {
        Ok(receiver) => receiver,
        Err(err) => {
            error!("{}", err);
            process::exit(1);
        }
    };

    if let Err(err) = fs::create_dir_all(CLIENT_FILE_PATH) {
        error!("Creating {:?} failed: {}", CLIENT_FILE_PATH, err);
        process::exit(1);
    }

    let dest = Path::new(CLIENT_FILE_PATH).join(file_name);
    if let Err(err) = receiver.fetch(file_name, &dest) {
        error!("{}", err);
        process::exit(1);
    }
}
