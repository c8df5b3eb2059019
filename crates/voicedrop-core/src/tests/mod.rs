mod multipart;
mod permission;
mod support;
