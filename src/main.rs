use std::fs::File;

use pdfparse as pdf;

/// Walks a PDF file: builds the cross-reference index from the `startxref`
/// entry point, then prints every object found from the top of the file.
fn main() -> Result<(), pdf::Error> {
    stderrlog::new()
        .verbosity(log::Level::Trace)
        .init()
        .unwrap();

    let Some(fname) = std::env::args().nth(1) else {
        println!("Usage: {} filename", std::env::args().next().unwrap());
        return Ok(())
    };

    let file = File::open(fname)?;
    let mut parser = pdf::ObjectParser::new(file);
    match parser.load_cross_references() {
        Ok(trailer) => println!("trailer {trailer}"),
        Err(err) => log::error!("could not build the cross-reference index: {err:?}")
    }

    parser.seek(0)?;
    loop {
        match parser.next_object() {
            Ok(pdf::Object::Eof) => break,
            Ok(obj) => println!("{obj}"),
            Err(err @ pdf::Error::Io(_)) => return Err(err),
            Err(err) => log::error!("skipping: {err:?}")
        }
    }

    Ok(())
}
