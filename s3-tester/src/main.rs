//! Command line entry point of the object store benchmark.

fn main() -> anyhow::Result<()> {
    s3_tester::cli::execute()
}
