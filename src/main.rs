fn main() {
    macdalert::utils::init_tracing();
    macdalert::cli::run();
}
