// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate failure;
extern crate image;
#[macro_use]
extern crate log;
extern crate mandelrow;
extern crate num;

use clap::{App, Arg, ArgMatches};
use image::pnm::PNMEncoder;
use image::pnm::{PNMSubtype, SampleEncoding};
use image::ColorType;
use mandelrow::{EscapeBuffer, EscapeParams, IntegralPlane, RowRenderer};
use num::{clamp, Complex};
use std::convert::TryFrom;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const SCALE: &str = "scale";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const THREADS: &str = "threads";
const ITERATIONS: &str = "iterations";
const THRESHOLD: &str = "threshold";

const MAX_THREADS: usize = 1024;

fn args<'a>() -> ArgMatches<'a> {
    App::new("mandelrow")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Row-scheduled parallel Mandelbrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file (binary PPM)"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image, e.g. 800x600; derived from --scale if absent"),
        )
        .arg(
            Arg::with_name(SCALE)
                .required(false)
                .long(SCALE)
                .short("p")
                .takes_value(true)
                .default_value("400")
                .validator(|s| {
                    validate_range(
                        &s,
                        1.0_f64,
                        10_000.0,
                        "Could not parse scale",
                        "Scale must be between 1 and 10000 pixels per unit",
                    )
                })
                .help("Pixels per unit of the complex plane, used when --size is absent"),
        )
        .arg(
            Arg::with_name(LEFTLOWER)
                .required(false)
                .allow_hyphen_values(true)
                .long(LEFTLOWER)
                .short("l")
                .takes_value(true)
                .default_value("-2.5,-1.0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left lower corner"))
                .help("Left lower corner of the mandelbrot space"),
        )
        .arg(
            Arg::with_name(RIGHTUPPER)
                .required(false)
                .allow_hyphen_values(true)
                .long(RIGHTUPPER)
                .short("r")
                .takes_value(true)
                .default_value("1.0,1.0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right upper corner"))
                .help("Right upper corner of the mandelbrot space"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        MAX_THREADS,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", MAX_THREADS),
                    )
                })
                .help("Number of row workers; defaults to one per CPU"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("1000")
                .validator(move |s| {
                    validate_range(
                        &s,
                        0_u32,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 0 and 1000000",
                    )
                })
                .help("Iteration cap per pixel"),
        )
        .arg(
            Arg::with_name(THRESHOLD)
                .required(false)
                .long(THRESHOLD)
                .short("e")
                .takes_value(true)
                .default_value("4.0")
                .validator(|s| {
                    validate_range(
                        &s,
                        ::std::f64::MIN_POSITIVE,
                        ::std::f64::MAX,
                        "Could not parse escape threshold",
                        "Escape threshold must be positive",
                    )
                })
                .help("Squared magnitude past which a point has escaped"),
        )
        .get_matches()
}

/// Map an iteration count to a color.  Points that never escaped are
/// black; everything else sits on a gradient running from dark blue
/// through green to a dull orange.
fn colorize(iterations: u32, max_iterations: u32) -> [u8; 3] {
    if iterations >= max_iterations {
        return [0, 0, 0];
    }
    let t = (f64::from(iterations) / f64::from(max_iterations)).sqrt();
    let u = 1.0 - t;
    let channel = |v: f64| clamp(v * 255.0, 0.0, 255.0) as u8;
    [
        channel(9.0 * u * t * t),
        channel(15.0 * u * u * t),
        channel(12.0 * u * u * u * t),
    ]
}

/// The image is drawn with the imaginary axis pointing up, so the last
/// row of the buffer is the first row of the picture.
fn pixelate(buffer: &EscapeBuffer, max_iterations: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(buffer.len() * 3);
    for row in buffer.rows().rev() {
        for &iterations in row {
            pixels.extend_from_slice(&colorize(iterations, max_iterations));
        }
    }
    pixels
}

/// The encoder takes 32-bit dimensions; refuse anything wider rather
/// than write a truncated header.
fn encoded_size(width: usize, height: usize) -> Result<(u32, u32), failure::Error> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(format_err!(
            "A {}x{} image is too large to encode",
            width,
            height
        )),
    }
}

fn write_image(outfile: &str, pixels: &[u8], bounds: (u32, u32)) -> Result<(), std::io::Error> {
    let path = Path::new(outfile);
    let output = File::create(&path)?;
    let mut encoder =
        PNMEncoder::new(output).with_subtype(PNMSubtype::Pixmap(SampleEncoding::Binary));
    encoder.encode(pixels, bounds.0, bounds.1, ColorType::RGB(8))?;
    Ok(())
}

fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, failure::Error> {
    matches
        .value_of(name)
        .and_then(|s| T::from_str(s).ok())
        .ok_or_else(|| format_err!("Could not parse --{}", name))
}

fn run(matches: &ArgMatches) -> Result<(), failure::Error> {
    let corner = |name: &str| {
        matches
            .value_of(name)
            .and_then(parse_complex)
            .ok_or_else(|| format_err!("Could not parse --{}", name))
    };
    let leftlower = corner(LEFTLOWER)?;
    let rightupper = corner(RIGHTUPPER)?;

    let image_size = match matches.value_of(SIZE) {
        Some(size) => {
            let (width, height) = parse_pair::<u16>(size, 'x')
                .ok_or_else(|| format_err!("Could not parse --{}", SIZE))?;
            IntegralPlane(width as usize, height as usize)
        }
        None => IntegralPlane::from_scale(leftlower, rightupper, value(matches, SCALE)?),
    };

    let params = EscapeParams::new(value(matches, ITERATIONS)?, value(matches, THRESHOLD)?)?;
    let threads = mandelrow::worker_count(match matches.value_of(THREADS) {
        Some(_) => Some(value(matches, THREADS)?),
        None => None,
    });

    let bounds = encoded_size(image_size.0, image_size.1)?;
    let renderer = RowRenderer::new(image_size.0, image_size.1, leftlower, rightupper, params)?;
    let buffer = renderer.render(threads)?;
    info!(
        "rendered {}x{} with {} workers",
        buffer.width(),
        buffer.height(),
        threads
    );

    let pixels = pixelate(&buffer, params.max_iterations);
    let outfile = matches
        .value_of(OUTPUT)
        .ok_or_else(|| format_err!("No output file given"))?;
    write_image(outfile, &pixels, bounds)?;
    Ok(())
}

fn main() {
    env_logger::init();
    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_and_corners() {
        assert_eq!(parse_pair::<u16>("800x600", 'x'), Some((800, 600)));
        assert_eq!(parse_pair::<u16>("800x", 'x'), None);
        assert_eq!(parse_pair::<u16>("800", 'x'), None);
        assert_eq!(parse_complex("-2.5,1"), Some(Complex::new(-2.5, 1.0)));
        assert_eq!(parse_complex("-2.5;1"), None);
    }

    #[test]
    fn validates_ranges() {
        assert!(validate_range("4", 1, 8, "nan", "range").is_ok());
        assert_eq!(validate_range("9", 1, 8, "nan", "range"), Err("range".to_string()));
        assert_eq!(validate_range::<usize>("x", 1, 8, "nan", "range"), Err("nan".to_string()));
    }

    #[test]
    fn encoded_size_passes_ordinary_images() {
        assert_eq!(encoded_size(1400, 800).unwrap(), (1400, 800));
        assert_eq!(
            encoded_size(u32::max_value() as usize, 1).unwrap(),
            (u32::max_value(), 1)
        );
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn encoded_size_refuses_to_truncate() {
        let too_wide = u32::max_value() as usize + 1;
        assert!(encoded_size(too_wide, 10).is_err());
        assert!(encoded_size(10, too_wide).is_err());
    }

    #[test]
    fn cap_is_black() {
        assert_eq!(colorize(100, 100), [0, 0, 0]);
        assert_eq!(colorize(0, 0), [0, 0, 0]);
    }

    #[test]
    fn immediate_escape_is_black_too() {
        // t = 0 zeroes every channel.
        assert_eq!(colorize(0, 100), [0, 0, 0]);
    }

    #[test]
    fn gradient_channels_are_clamped() {
        // At t = 2/3 the red channel would be 4/3 of full scale.
        let [r, _, _] = colorize(44, 100);
        assert_eq!(r, 255);
    }

    #[test]
    fn pixelate_flips_rows() {
        // One column: row 0 is the origin, row 1 is 1.2i, which escapes
        // after a single step.
        let renderer = RowRenderer::new(
            1,
            2,
            Complex::new(0.0, 0.0),
            Complex::new(1.0, 2.4),
            EscapeParams::new(10, 4.0).unwrap(),
        )
        .unwrap();
        let buffer = renderer.render_single().unwrap();
        assert_eq!(buffer.row(0), Some(&[10][..]));
        assert_eq!(buffer.row(1), Some(&[1][..]));
        let pixels = pixelate(&buffer, 10);
        assert_eq!(pixels.len(), 6);
        assert_eq!(&pixels[0..3], &colorize(1, 10));
        assert_ne!(&pixels[0..3], &[0, 0, 0]);
        assert_eq!(&pixels[3..6], &[0, 0, 0]);
    }
}
