use uuid::Uuid;

const ID_LEN: usize = 12;

/// Random short token used for parts, modules and lessons created client-side.
pub fn new_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(ID_LEN);
    id
}
