pub mod connection;
pub mod day_cards;
pub mod image_records;
pub(crate) mod schema;
pub mod shared_prefs;
pub mod symptom_images;
pub mod symptoms;
#[cfg(test)]
pub(crate) mod test_utils;

pub use connection::{DbPool, init_db};
pub use day_cards::{
    add_symptom, get_day_card_for_date, get_day_cards, get_days_with_symptoms, save_day_card,
};
pub use image_records::{
    delete_image_record, get_all_image_records, get_favorite_image_records, get_image_record,
    save_image_record, toggle_favorite,
};
pub use shared_prefs::{get_value, set_value};
pub use symptom_images::{
    attach_to_symptom, delete_symptom_image, get_all_symptom_images, get_symptom_image,
    save_symptom_image,
};
pub use symptoms::{
    delete_symptom, get_symptom_days, get_symptoms, get_symptoms_by_month, get_symptoms_for_date,
    save_symptom, update_symptom,
};
