use crate::store::familiar::Familiar;

/// The five placeholder familiars written when no document exists yet.
pub fn seed_familiars() -> Vec<Familiar> {
    [
        ("m1", "ai_1", "watch1", "owl1", "Nebula", "Owl", "Old Watch", 150, 30, 0, 15.0, 1_700_000_000_000),
        ("m2", "ai_2", "charcoal2", "fox2", "Cinder", "Fox", "Charcoal", 100, 15, 1, 12.0, 1_700_000_100_000),
        ("m3", "ai_3", "feather3", "raven3", "Whisper", "Raven", "Feather", 250, 50, 2, 18.0, 1_700_000_200_000),
        ("m4", "ai_4", "crystal4", "cat4", "Glimmer", "Cat", "Crystal", 180, 30, 3, 20.0, 1_700_000_300_000),
        ("m5", "ai_5", "rock5", "toad5", "Moss", "Toad", "Rock", 60, 15, 4, 10.0, 1_700_000_400_000),
    ]
    .into_iter()
    .map(
        |(id, user, item_seed, animal_seed, name, species, item, likes, dislikes, lane, speed, created)| {
            Familiar {
                id: id.to_owned(),
                user_id: user.to_owned(),
                original_image: format!("https://picsum.photos/seed/{item_seed}/300/300"),
                generated_image: format!("https://picsum.photos/seed/{animal_seed}/300/300"),
                animal_name: name.to_owned(),
                animal_species: species.to_owned(),
                original_item_name: item.to_owned(),
                magic_power: likes as i64 - dislikes as i64,
                created_time: created,
                likes,
                dislikes,
                lane: Some(lane),
                speed: Some(speed),
                is_main: false,
            }
        },
    )
    .collect()
}
