fn main() -> anyhow::Result<()> {
    let result = vterm::app::run();

    // Flush whatever the renderer left behind before an error is printed
    use std::io::{self, Write};
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();

    result
}
