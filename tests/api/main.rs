mod helpers;
mod home;
mod pages;
