//! Test fixtures: song list directories and pictures

use super::constants::*;
use anyhow::Result;
use image::{ImageFormat, Rgb, RgbImage};
use rust_xlsxwriter::Workbook;
use std::fs;
use std::io::Cursor;
use tempfile::TempDir;

/// Creates a song library with lists for Angry, Happy and Sad.
///
/// The Neutral directory exists but is empty, so any Neutral lookup fails.
/// Happy is an .xlsx workbook, the others are CSV files.
pub fn create_test_songs() -> Result<TempDir> {
    let dir = TempDir::new()?;

    let angry = dir.path().join("Angry");
    fs::create_dir_all(&angry)?;
    fs::write(
        angry.join("angry_songs.csv"),
        format!(
            "ID,Song,Artist\n1,{},Rage Against the Machine\n2,Break Stuff,Limp Bizkit\n",
            ANGRY_FIRST_SONG
        ),
    )?;
    // Sorted after angry_songs.csv, never picked
    fs::write(angry.join("zz_backup.csv"), "ID,Song,Artist\n9,Ignored,Nobody\n")?;

    let sad = dir.path().join("Sad");
    fs::create_dir_all(&sad)?;
    fs::write(
        sad.join("sad_songs.csv"),
        format!(
            "ID,Song,Artist\n1,{},R.E.M.\n2,Hurt,Johnny Cash\n",
            SAD_FIRST_SONG
        ),
    )?;

    let happy = dir.path().join("Happy");
    fs::create_dir_all(&happy)?;
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "ID")?;
    sheet.write_string(0, 1, "Song")?;
    sheet.write_string(0, 2, "Artist")?;
    sheet.write_number(1, 0, 1)?;
    sheet.write_string(1, 1, HAPPY_FIRST_SONG)?;
    sheet.write_string(1, 2, HAPPY_FIRST_ARTIST)?;
    sheet.write_number(2, 0, 2)?;
    sheet.write_string(2, 1, "Happy")?;
    sheet.write_string(2, 2, "Pharrell Williams")?;
    workbook.save(happy.join("happy_songs.xlsx"))?;

    fs::create_dir_all(dir.path().join("Neutral"))?;

    Ok(dir)
}

/// A solid PNG picture of the given gray level.
pub fn gray_png(level: u8) -> Vec<u8> {
    let image = RgbImage::from_pixel(96, 96, Rgb([level, level, level]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode test picture");
    bytes
}
