fn main() {
    juris_test::cli::run();
}
