fn main() {
    little_lemon_api::main();
}
