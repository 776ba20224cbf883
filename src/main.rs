fn main() -> std::process::ExitCode {
    book_scanner_lib::run()
}
