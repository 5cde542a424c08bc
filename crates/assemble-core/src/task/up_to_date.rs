/// Can check if this value is up to date.
pub trait UpToDate {
    /// Whether this value is up to date.
    ///
    /// By default, everything is always not up to date.
    fn up_to_date(&self) -> bool {
        false
    }
}

assert_obj_safe!(UpToDate);
