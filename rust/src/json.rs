use color_eyre::eyre::{Result, WrapErr};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs::File, io::BufReader, path::Path};

pub(crate) fn read<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let file = File::open(path).wrap_err_with(|| format!("can't open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .wrap_err_with(|| format!("can't read JSON from {}", path.display()))
}

pub(crate) fn write<T, W>(x: &T, out_w: W) -> Result<()>
where
    T: Serialize,
    W: std::io::Write + Copy,
{
    use std::io::{BufWriter, Write};

    let mut buffered_out_w = BufWriter::new(out_w);
    let json = serde_json::to_string(x)?;
    writeln!(buffered_out_w, "{}", &json)?;

    Ok(())
}
