fn main() {
    if let Err(err) = datawagon::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
