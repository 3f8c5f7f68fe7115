use vergen::Emitter;
use vergen_git2::Git2Builder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only the commit SHA is stamped into `--version`. Source tarballs carry
    // no git metadata, so fall back to a fixed value there.
    match Git2Builder::default().sha(true).build() {
        Ok(git2) => Emitter::default().add_instructions(&git2)?.emit()?,
        Err(_) => println!("cargo:rustc-env=VERGEN_GIT_SHA=unknown"),
    }
    Ok(())
}
