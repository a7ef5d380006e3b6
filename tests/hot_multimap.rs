use hot_set::tombstone::{ConstI32, ConstU8};
use hot_set::{DynamicValue, HotMultiMap};

#[test]
fn values_of_one_key_are_disambiguated() {
    let mut m: HotMultiMap<i32, Option<&str>, DynamicValue<i32>, DynamicValue<Option<&str>>> =
        HotMultiMap::with_tombstone(DynamicValue::new(-1), DynamicValue::new(None));
    m.insert(3, Some("3"));
    m.insert(3, Some("three"));
    m.insert(3, Some("tres"));
    assert_eq!(m.len(), 3);
    assert!(m.find(&3, &Some("three")).is_some());
    assert!(m.find(&3, &Some("vier")).is_none());
}

#[test]
fn many_values_survive_growth_and_removal() {
    let mut m: HotMultiMap<u8, u32, ConstU8<{ u8::MAX }>> = HotMultiMap::new();
    for v in 0..300u32 {
        m.insert((v % 3) as u8, v);
    }
    assert_eq!(m.len(), 300);
    assert_eq!(m.count(&0u8), 100);
    assert_eq!(m.remove_all(&1u8), 100);
    assert_eq!(m.len(), 200);
    assert_eq!(m.count(&1u8), 0);
    let mut twos: Vec<u32> = m.get_all(&2u8).into_iter().copied().collect();
    twos.sort_unstable();
    assert_eq!(twos, (0..300u32).filter(|v| v % 3 == 2).collect::<Vec<_>>());
    for v in (0..300u32).filter(|v| v % 3 == 0) {
        assert!(m.contains(&0u8, &v));
    }
}

#[test]
fn bucket_resolves_stored_pair() {
    let mut m: HotMultiMap<i32, i32, ConstI32<-1>> = HotMultiMap::new();
    m.insert(1, 10);
    m.insert(1, 11);
    let b = m.find(&1, &11).expect("stored pair");
    assert_eq!(m.get_at(b), Some((&1, &11)));
    assert!(m.remove(&1, &11));
    // The repair may have moved (1, 10) into the vacated slot.
    assert!(matches!(m.get_at(b), None | Some((&1, &10))));
    assert!(m.contains(&1, &10));
}

#[test]
fn iteration_lists_every_pair() {
    let m: HotMultiMap<i32, char, ConstI32<-1>> =
        [(1, 'a'), (1, 'b'), (2, 'a'), (1, 'a')].into_iter().collect();
    let mut pairs: Vec<(i32, char)> = m.iter().map(|(k, v)| (*k, *v)).collect();
    pairs.sort_unstable();
    assert_eq!(pairs, [(1, 'a'), (1, 'b'), (2, 'a')]);
}
