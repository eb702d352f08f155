pub mod work_list;

pub use work_list::load_work_ids;
