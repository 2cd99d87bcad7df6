mod admin;
mod cases;
mod wallet;
