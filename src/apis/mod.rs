pub mod html_table;
