use avl_set::AvlTreeSet;

fn main() {
    let mut set = AvlTreeSet::new();
    for x in [5, 3, 4, 10, 20, 30] {
        set.insert(x);
    }
    let (_, inserted) = set.insert(4);
    assert!(!inserted);
    assert!(set.contains(&10));

    let next = set.erase(set.find(&10));
    println!("erased 10, next is {:?}", set.value_at(next));

    print!("{{ ");
    for x in &set {
        print!("{x}, ");
    }
    println!("}}");

    print!("descending: ");
    let mut pos = set.rbegin();
    while pos != set.rend() {
        print!("{} ", set[pos]);
        pos = set.predecessor(pos);
    }
    println!();

    let lower = set.lower_bound(&6);
    let upper = set.upper_bound(&20);
    println!("lower_bound(6) = {:?}", set.value_at(lower));
    println!("upper_bound(20) = {:?}", set.value_at(upper));

    let mut cursor = set.cursor_mut(set.begin());
    while let Some(&x) = cursor.current() {
        if x % 2 == 0 {
            cursor.remove_current();
        } else {
            cursor.move_next();
        }
    }
    println!("odd values: {:?}", set);
}
