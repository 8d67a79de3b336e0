use super::*;

#[test]
fn test_pos_ordering() {
    assert!(Pos::new(1, 6).is_before(Pos::new(2, 1)));
    assert!(Pos::new(3, 2).is_before(Pos::new(3, 9)));
    assert!(!Pos::new(3, 9).is_before(Pos::new(3, 9)));
    assert!(!Pos::new(4, 1).is_before(Pos::new(3, 9)));
}

#[test]
fn test_unknown_sorts_last() {
    assert!(Pos::new(100, 1).is_before(Pos::NONE));
    assert!(!Pos::NONE.is_before(Pos::new(1, 1)));
    assert!(!Pos::NONE.is_before(Pos::NONE));
}

#[test]
fn test_pos_or() {
    let known = Pos::new(5, 5);
    assert_eq!(Pos::NONE.or(known), known);
    assert_eq!(known.or(Pos::new(9, 9)), known);
}

#[test]
fn test_pos_display() {
    assert_eq!(Pos::new(12, 4).to_string(), "12:4");
    assert_eq!(Pos::NONE.to_string(), "<unknown line number>");
    assert_eq!(format!("{:?}", Pos::new(1, 2)), "1:2");
}

#[test]
fn test_pos_default_is_none() {
    assert_eq!(Pos::default(), Pos::NONE);
    assert!(!Pos::NONE.is_known());
}
