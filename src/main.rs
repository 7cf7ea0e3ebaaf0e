fn main() {
    ktsyntax::cli::run();
}
