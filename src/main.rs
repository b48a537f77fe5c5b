fn main() {
    minibo::cli::main();
}
