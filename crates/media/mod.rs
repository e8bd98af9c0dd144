pub mod image_resizer;
