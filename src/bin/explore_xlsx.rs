//! Utility to explore XLSX structure for development
use unsheet::container::Package;

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or("test-files/Ventas.xlsx".to_string());
    let package = Package::open(&path).expect("Failed to open file");

    println!("=== Parts in archive ===");
    for file in package.list_files() {
        println!("  {}", file);
    }

    println!("\n=== xl/workbook.xml ===");
    if let Ok(content) = package.read_xml("xl/workbook.xml") {
        println!("{}", preview(&content, 2000));
    }

    println!("\n=== xl/_rels/workbook.xml.rels ===");
    if let Ok(content) = package.read_xml("xl/_rels/workbook.xml.rels") {
        println!("{}", content);
    }

    println!("\n=== xl/sharedStrings.xml (first 2000 chars) ===");
    if let Ok(content) = package.read_xml("xl/sharedStrings.xml") {
        println!("{}", preview(&content, 2000));
    }

    println!("\n=== xl/worksheets/sheet1.xml (first 3000 chars) ===");
    if let Ok(content) = package.read_xml("xl/worksheets/sheet1.xml") {
        println!("{}", preview(&content, 3000));
    }
}

fn preview(content: &str, max_chars: usize) -> String {
    content.chars().take(max_chars).collect()
}
