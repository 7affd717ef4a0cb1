fn main() {
    if let Err(err) = cafe_sales::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
