//! Shared fixtures for integration tests

use std::fmt::Write;

const GENRES: &[&str] = &["Fantasy", "Thriller", "Romance", "Mystery", "Horror"];
const LANGUAGES: &[&str] = &["en", "de", "fr", "es"];

/// A `;`-delimited labeled dataset of `n` books.
///
/// Even rows are adapted books with famous authors and large sales, odd
/// rows are small releases by new authors. Twelve publishers and fifteen
/// authors rotate through the rows so rare-category collapsing applies.
pub fn books_csv(n: usize) -> String {
    let mut csv = String::from(
        "Book_Name;Publishing_Year;Author;Author_Rating;Average_Rating;Rating_Count;Gross_Sales_EUR;Language_Code;Genre;Publisher;Adapted_to_Film\n",
    );
    for i in 0..n {
        let adapted = i % 2 == 0;
        let (rating, average, count, sales) = if adapted {
            (
                if i % 4 == 0 { "Famous" } else { "Excellent" },
                format!("{},{}", 4, 1 + i % 8),
                format!("{}", 8000 + i * 150),
                format!("{}.{:03},00 €", 600 + i * 7, i % 1000),
            )
        } else {
            (
                if i % 4 == 1 { "Novice" } else { "Intermediate" },
                format!("{},{}", 3, i % 9),
                format!("{}", 40 + i * 3),
                format!("{},{:02} €", 1500 + i * 20, i % 100),
            )
        };
        writeln!(
            csv,
            "Book {i};{};Author {};{rating};{average};{count};{sales};{};{};Press {};{}",
            1980 + (i * 7) % 40,
            i % 15,
            LANGUAGES[i % LANGUAGES.len()],
            GENRES[i % GENRES.len()],
            i % 12,
            u8::from(adapted)
        )
        .unwrap();
    }
    csv
}

/// The same books without the label column
pub fn unlabeled_csv(n: usize) -> String {
    books_csv(n)
        .lines()
        .map(|line| {
            let cut = line.rfind(';').unwrap();
            format!("{}\n", &line[..cut])
        })
        .collect()
}
